//! Category management command implementations

use anyhow::Result;
use nilufar_core::Database;

pub fn cmd_categories_list(db: &Database) -> Result<()> {
    let categories = db.list_categories()?;

    if categories.is_empty() {
        println!("No categories defined. Add one with:");
        println!("  nilufar categories add <chinese-name> <uyghur-name>");
        return Ok(());
    }

    println!();
    println!("📋 Expense Categories");
    println!("   ─────────────────────────────────────────────");
    for category in &categories {
        println!(
            "   [{:>3}] {} {} / {}",
            category.id, category.emoji, category.name_cn, category.name_ug
        );
    }
    Ok(())
}

pub fn cmd_categories_add(
    db: &Database,
    name_cn: &str,
    name_ug: &str,
    emoji: Option<&str>,
) -> Result<()> {
    let id = db.add_category(name_cn, name_ug, emoji.unwrap_or(""))?;
    let category = db.get_category(id)?;
    println!(
        "✅ Added category [{}]: {} {} / {}",
        id, category.emoji, category.name_cn, category.name_ug
    );
    Ok(())
}

pub fn cmd_categories_edit(
    db: &Database,
    id: i64,
    name_cn: Option<&str>,
    name_ug: Option<&str>,
    emoji: Option<&str>,
) -> Result<()> {
    db.update_category(id, name_cn, name_ug, emoji)?;
    let category = db.get_category(id)?;
    println!(
        "✅ Updated category [{}]: {} {} / {}",
        id, category.emoji, category.name_cn, category.name_ug
    );
    Ok(())
}

pub fn cmd_categories_delete(db: &Database, id: i64) -> Result<()> {
    let category = db.get_category(id)?;
    db.delete_category(id)?;
    println!("✅ Deleted category [{}]: {}", id, category.name_cn);
    Ok(())
}

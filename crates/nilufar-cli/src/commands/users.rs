//! Operator account command implementations

use anyhow::{bail, Result};
use nilufar_core::Database;

pub fn cmd_users_list(db: &Database) -> Result<()> {
    let users = db.list_users()?;

    println!();
    println!("👥 Operator Accounts");
    println!("   ─────────────────────────────");
    for user in &users {
        println!("   [{:>3}] {} ({})", user.id, user.username, user.role);
    }
    Ok(())
}

pub fn cmd_users_add(db: &Database, username: &str, password: &str) -> Result<()> {
    let id = db.add_user(username, password)?;
    println!("✅ Added user [{}]: {}", id, username.trim());
    Ok(())
}

pub fn cmd_users_delete(db: &Database, id: i64) -> Result<()> {
    db.delete_user(id)?;
    println!("✅ Deleted user [{}]", id);
    Ok(())
}

pub fn cmd_users_passwd(
    db: &Database,
    username: &str,
    old_password: &str,
    new_username: Option<&str>,
    new_password: Option<&str>,
) -> Result<()> {
    let Some(id) = db.user_id(username)? else {
        bail!("Unknown user '{}'", username);
    };

    db.update_credentials(id, old_password, new_username, new_password)?;

    let display = new_username.unwrap_or(username);
    println!("✅ Updated credentials for '{}'", display);
    Ok(())
}

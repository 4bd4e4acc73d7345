use anyhow::{Context, Result};
use watsong_catalog::Config;
use watsong_core::schema::Database;
use watsong_core::MemoKind;

pub fn show_status(config: &Config) -> Result<()> {
    let db_path = &config.database_path;
    let db = Database::open(db_path)
        .with_context(|| format!("Failed to open memo database: {}", db_path.display()))?;

    println!("\n📊 Watsong Status\n");
    println!("  Database: {}", db_path.display());

    let mut total = 0;
    for kind in MemoKind::ALL {
        let count = db.count_memo_entries(kind)?;
        total += count;
        println!("  {:<10} {count}", format!("{kind}:"));
    }

    if total == 0 {
        println!("\n  Run `watsong prime <ALBUMS>` to warm the memo");
    }

    Ok(())
}

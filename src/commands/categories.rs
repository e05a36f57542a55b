// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::models::TransactionKind;
use crate::utils::pretty_table;
use anyhow::Result;
use rusqlite::{Connection, params};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let user = sub.get_one::<String>("user").unwrap();
            let name = sub.get_one::<String>("name").map(|s| s.trim()).unwrap();
            let kind = TransactionKind::try_from(sub.get_one::<String>("kind").unwrap().as_str())?;
            let color = sub
                .get_one::<String>("color")
                .map(|s| s.as_str())
                .unwrap_or("#607D8B");
            let icon = sub
                .get_one::<String>("icon")
                .map(|s| s.as_str())
                .unwrap_or("tag");
            conn.execute(
                "INSERT INTO categories(name, kind, color, icon, user_id, is_default)
                 VALUES (?1, ?2, ?3, ?4, ?5, 0)",
                params![name, kind.as_str(), color, icon, user],
            )?;
            println!("Added category '{}' ({}) for {}", name, kind.as_str(), user);
        }
        Some(("list", sub)) => {
            let user = sub.get_one::<String>("user").unwrap();
            let kind = sub.get_one::<String>("kind");
            let mut sql = String::from(
                "SELECT name, kind, color, icon, is_default FROM categories
                 WHERE (is_default=1 OR user_id=?1)",
            );
            if kind.is_some() {
                sql.push_str(" AND kind=?2");
            }
            sql.push_str(" ORDER BY is_default DESC, name");
            let mut stmt = conn.prepare(&sql)?;
            let map_row = |r: &rusqlite::Row<'_>| {
                Ok((
                    r.get::<_, String>(0)?,
                    r.get::<_, String>(1)?,
                    r.get::<_, String>(2)?,
                    r.get::<_, String>(3)?,
                    r.get::<_, bool>(4)?,
                ))
            };
            let rows = match kind {
                Some(k) => stmt.query_map(params![user, k], map_row)?,
                None => stmt.query_map(params![user], map_row)?,
            };
            let mut data = Vec::new();
            for row in rows {
                let (name, kind, color, icon, is_default) = row?;
                let scope = if is_default { "default" } else { "personal" };
                data.push(vec![name, kind, color, icon, scope.to_string()]);
            }
            println!(
                "{}",
                pretty_table(&["Category", "Kind", "Color", "Icon", "Scope"], data)
            );
        }
        Some(("rm", sub)) => {
            let user = sub.get_one::<String>("user").unwrap();
            let name = sub.get_one::<String>("name").unwrap();
            let kind = TransactionKind::try_from(sub.get_one::<String>("kind").unwrap().as_str())?;
            // Default categories are shared and cannot be removed per user.
            let n = conn.execute(
                "DELETE FROM categories WHERE user_id=?1 AND name=?2 AND kind=?3 AND is_default=0",
                params![user, name, kind.as_str()],
            )?;
            if n == 0 {
                anyhow::bail!("No personal category '{}' ({}) for {}", name, kind.as_str(), user);
            }
            println!("Removed category '{}' ({})", name, kind.as_str());
        }
        _ => {}
    }
    Ok(())
}

//! Console statistics over the loaded jobs relation.

use std::collections::HashMap;

use anyhow::Result;
use itertools::Itertools;
use rusqlite::Connection;

const TOP_SKILLS: usize = 15;

pub fn print_stats(conn: &Connection) -> Result<()> {
    let total: i64 = conn.query_row("SELECT COUNT(*) FROM jobs", [], |r| r.get(0))?;
    if total == 0 {
        println!("No jobs loaded; skipping stats.");
        return Ok(());
    }
    let total = total as usize;
    let distinct: i64 =
        conn.query_row("SELECT COUNT(DISTINCT job_id) FROM jobs", [], |r| r.get(0))?;

    let with_salary = band_count(conn, "salary_avg")?;
    let with_hourly = band_count(conn, "hourly_rate_avg")?;
    let no_pay = no_pay_count(conn)?;

    let type_counts = type_counts(conn)?;
    let skill_counts = skill_counts(conn)?;

    let markdown = render_markdown(
        total,
        distinct as usize,
        with_salary,
        with_hourly,
        no_pay,
        &type_counts,
        &skill_counts,
    );
    println!("{markdown}");
    Ok(())
}

fn band_count(conn: &Connection, column: &str) -> Result<usize> {
    let sql = format!("SELECT COUNT(*) FROM jobs WHERE {column} IS NOT NULL");
    let count: i64 = conn.query_row(&sql, [], |r| r.get(0))?;
    Ok(count as usize)
}

/// Rows with neither pay band. A loaded row can carry both bands at once,
/// so this is its own count, not the remainder of the band counts.
fn no_pay_count(conn: &Connection) -> Result<usize> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM jobs WHERE salary_avg IS NULL AND hourly_rate_avg IS NULL",
        [],
        |r| r.get(0),
    )?;
    Ok(count as usize)
}

fn type_counts(conn: &Connection) -> Result<Vec<(String, usize)>> {
    let mut stmt = conn.prepare(
        "SELECT COALESCE(job_type, '(none)'), COUNT(*) FROM jobs
         GROUP BY job_type
         ORDER BY COUNT(*) DESC, job_type",
    )?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize)))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Count canonical skills across every row's JSON list. Rows whose list
/// fails to parse are skipped; the loader already rejects them on the way
/// in, so anything here predates the current schema.
fn skill_counts(conn: &Connection) -> Result<Vec<(String, usize)>> {
    let mut stmt = conn.prepare("SELECT req_skills FROM jobs")?;
    let lists = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .filter_map(|r| r.ok());

    let mut counts: HashMap<String, usize> = HashMap::new();
    for list in lists {
        let Ok(skills) = serde_json::from_str::<Vec<String>>(&list) else {
            continue;
        };
        for skill in skills {
            *counts.entry(skill).or_insert(0) += 1;
        }
    }

    Ok(counts
        .into_iter()
        .sorted_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)))
        .take(TOP_SKILLS)
        .collect())
}

fn render_markdown(
    total: usize,
    distinct: usize,
    with_salary: usize,
    with_hourly: usize,
    no_pay: usize,
    type_counts: &[(String, usize)],
    skill_counts: &[(String, usize)],
) -> String {
    let mut out = String::new();
    out.push_str("## Jobs Dataset\n");
    out.push_str(&format!("- Total listings: {}\n", total));
    out.push_str(&format!("- Distinct job ids: {}\n", distinct));
    out.push_str(&format!(
        "- With annual salary range: {} ({:.1}%)\n",
        with_salary,
        percent(with_salary, total)
    ));
    out.push_str(&format!(
        "- With hourly rate range: {} ({:.1}%)\n",
        with_hourly,
        percent(with_hourly, total)
    ));
    out.push_str(&format!("- With no pay information: {}\n", no_pay));

    out.push_str("\n### Employment types\n");
    for (label, count) in type_counts {
        out.push_str(&format!("- {}: {} ({:.1}%)\n", label, count, percent(*count, total)));
    }

    out.push_str(&format!("\n### Most requested skills (top {})\n", TOP_SKILLS));
    for (skill, count) in skill_counts {
        out.push_str(&format!("- {}: {}\n", skill, count));
    }
    out
}

fn percent(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{self, JobRow};

    fn row(id: &str, job_type: Option<&str>, skills: &[&str], salary: Option<f64>) -> JobRow {
        JobRow {
            job_id: id.to_string(),
            title: "T".to_string(),
            company: "C".to_string(),
            location: "L".to_string(),
            salary_lower: salary,
            salary_avg: salary,
            salary_upper: salary,
            hourly_rate_lower: None,
            hourly_rate_avg: None,
            hourly_rate_upper: None,
            job_type: job_type.map(str::to_string),
            req_skills: skills.iter().map(|s| s.to_string()).collect(),
        }
    }

    fn loaded_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let rows = vec![
            row("a", Some("Full-time"), &["Python", "SQL"], Some(90000.0)),
            row("b", Some("Full-time"), &["Python"], None),
            row("c", None, &["R"], None),
        ];
        db::insert_jobs(&conn, &rows).unwrap();
        conn
    }

    #[test]
    fn type_counts_sort_by_frequency() {
        let conn = loaded_conn();
        let counts = type_counts(&conn).unwrap();
        assert_eq!(counts[0], ("Full-time".to_string(), 2));
        assert!(counts.contains(&("(none)".to_string(), 1)));
    }

    #[test]
    fn skill_counts_aggregate_json_lists() {
        let conn = loaded_conn();
        let counts = skill_counts(&conn).unwrap();
        assert_eq!(counts[0], ("Python".to_string(), 2));
        let ties: Vec<&str> = counts[1..].iter().map(|(s, _)| s.as_str()).collect();
        assert_eq!(ties, vec!["R", "SQL"]); // ties break alphabetically
    }

    #[test]
    fn band_counts_use_the_avg_column() {
        let conn = loaded_conn();
        assert_eq!(band_count(&conn, "salary_avg").unwrap(), 1);
        assert_eq!(band_count(&conn, "hourly_rate_avg").unwrap(), 0);
    }

    #[test]
    fn no_pay_counts_rows_with_neither_band() {
        let conn = loaded_conn();
        assert_eq!(no_pay_count(&conn).unwrap(), 2);
    }

    #[test]
    fn stats_accept_a_row_carrying_both_bands() {
        let conn = Connection::open_in_memory().unwrap();
        db::init_schema(&conn).unwrap();
        let mut both = row("d", Some("Contract"), &["SQL"], Some(105000.0));
        both.hourly_rate_lower = Some(25.0);
        both.hourly_rate_avg = Some(30.0);
        both.hourly_rate_upper = Some(35.0);
        db::insert_jobs(&conn, &[both]).unwrap();

        assert_eq!(band_count(&conn, "salary_avg").unwrap(), 1);
        assert_eq!(band_count(&conn, "hourly_rate_avg").unwrap(), 1);
        assert_eq!(no_pay_count(&conn).unwrap(), 0);
        print_stats(&conn).unwrap();
    }
}

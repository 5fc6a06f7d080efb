//! Analysis and subscription persistence
//!
//! SQLite-backed storage for analyses, their findings, and subscription
//! records. Findings live and die with their parent analysis; deleting an
//! analysis cascades.

use anyhow::Result;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use crate::audit::{AnalysisDepth, AnalysisReport, Category, Finding, FindingStatus};
use crate::entitlement::{Plan, Subscription, SubscriptionStatus};

pub fn open(db_path: &str) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    configure(&conn)?;
    Ok(conn)
}

fn configure(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    init(conn)
}

fn init(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS analyses (
          id TEXT PRIMARY KEY,
          user_id TEXT NOT NULL,
          url TEXT NOT NULL,
          depth TEXT NOT NULL,
          meta_score INTEGER,
          content_score INTEGER,
          technical_score INTEGER,
          overall_score INTEGER NOT NULL,
          created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS findings (
          id INTEGER PRIMARY KEY AUTOINCREMENT,
          analysis_id TEXT NOT NULL REFERENCES analyses(id) ON DELETE CASCADE,
          category TEXT NOT NULL,
          component TEXT NOT NULL,
          status TEXT NOT NULL,
          score INTEGER NOT NULL,
          description TEXT NOT NULL,
          recommendation TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS subscriptions (
          user_id TEXT PRIMARY KEY,
          plan TEXT NOT NULL,
          status TEXT NOT NULL,
          renews_at TEXT,
          updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ','now'))
        );

        CREATE INDEX IF NOT EXISTS idx_analyses_user_created ON analyses(user_id, created_at);
        CREATE INDEX IF NOT EXISTS idx_findings_analysis ON findings(analysis_id);
        "#,
    )?;
    Ok(())
}

/// One stored analysis row, scores as persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisRecord {
    pub id: String,
    pub user_id: String,
    pub url: String,
    pub depth: AnalysisDepth,
    pub meta_score: Option<u8>,
    pub content_score: Option<u8>,
    pub technical_score: Option<u8>,
    pub overall_score: u8,
    pub created_at: DateTime<Utc>,
}

/// Persist a report and its findings in one transaction, returning the new
/// analysis id.
pub fn insert_analysis(
    conn: &mut Connection,
    user_id: &str,
    report: &AnalysisReport,
    created_at: DateTime<Utc>,
) -> Result<String> {
    let id = Uuid::new_v4().to_string();
    let tx = conn.transaction()?;

    tx.execute(
        r#"
        INSERT INTO analyses (
          id, user_id, url, depth,
          meta_score, content_score, technical_score, overall_score, created_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            id,
            user_id,
            report.url,
            report.depth.as_str(),
            report.category_scores.get(&Category::Meta).copied(),
            report.category_scores.get(&Category::Content).copied(),
            report.category_scores.get(&Category::Technical).copied(),
            report.overall_score,
            timestamp(created_at),
        ],
    )?;

    for finding in &report.findings {
        tx.execute(
            r#"
            INSERT INTO findings (
              analysis_id, category, component, status, score, description, recommendation
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                id,
                finding.category.as_str(),
                finding.component,
                finding.status.as_str(),
                finding.score,
                finding.description,
                finding.recommendation,
            ],
        )?;
    }

    tx.commit()?;
    tracing::debug!(analysis_id = %id, user_id, "analysis persisted");
    Ok(id)
}

pub fn get_analysis(conn: &Connection, id: &str) -> Result<Option<AnalysisRecord>> {
    let row = conn
        .query_row(
            r#"
            SELECT id, user_id, url, depth,
                   meta_score, content_score, technical_score, overall_score, created_at
            FROM analyses WHERE id = ?1
            "#,
            params![id],
            raw_analysis_row,
        )
        .optional()?;

    row.map(AnalysisRecord::try_from).transpose()
}

pub fn list_analyses_for_user(conn: &Connection, user_id: &str) -> Result<Vec<AnalysisRecord>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT id, user_id, url, depth,
               meta_score, content_score, technical_score, overall_score, created_at
        FROM analyses WHERE user_id = ?1
        ORDER BY created_at DESC
        "#,
    )?;
    let rows = stmt.query_map(params![user_id], raw_analysis_row)?;

    let mut records = Vec::new();
    for row in rows {
        records.push(AnalysisRecord::try_from(row?)?);
    }
    Ok(records)
}

pub fn findings_for(conn: &Connection, analysis_id: &str) -> Result<Vec<Finding>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT category, component, status, score, description, recommendation
        FROM findings WHERE analysis_id = ?1
        ORDER BY id
        "#,
    )?;
    let rows = stmt.query_map(params![analysis_id], |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, i64>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
        ))
    })?;

    let mut findings = Vec::new();
    for row in rows {
        let (category, component, status, score, description, recommendation) = row?;
        findings.push(Finding {
            category: category.parse::<Category>()?,
            component,
            status: status.parse::<FindingStatus>()?,
            score: u8::try_from(score)?,
            description,
            recommendation,
        });
    }
    Ok(findings)
}

/// Remove an analysis; its findings cascade away with it.
pub fn delete_analysis(conn: &Connection, id: &str) -> Result<bool> {
    let deleted = conn.execute("DELETE FROM analyses WHERE id = ?1", params![id])?;
    Ok(deleted > 0)
}

/// Analyses a user created at or after `since`. Feeds the quota check.
pub fn count_analyses_since(
    conn: &Connection,
    user_id: &str,
    since: DateTime<Utc>,
) -> Result<u32> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM analyses WHERE user_id = ?1 AND created_at >= ?2",
        params![user_id, timestamp(since)],
        |row| row.get(0),
    )?;
    Ok(count as u32)
}

/// Apply a subscription mutation, e.g. one produced by a billing webhook.
pub fn upsert_subscription(
    conn: &Connection,
    user_id: &str,
    subscription: &Subscription,
) -> Result<()> {
    conn.execute(
        r#"
        INSERT INTO subscriptions (user_id, plan, status, renews_at)
        VALUES (?1, ?2, ?3, ?4)
        ON CONFLICT(user_id) DO UPDATE SET
          plan = excluded.plan,
          status = excluded.status,
          renews_at = excluded.renews_at,
          updated_at = strftime('%Y-%m-%dT%H:%M:%SZ','now')
        "#,
        params![
            user_id,
            subscription.plan.as_str(),
            subscription.status.as_str(),
            subscription.renews_at.map(timestamp),
        ],
    )?;
    Ok(())
}

pub fn subscription_for(conn: &Connection, user_id: &str) -> Result<Option<Subscription>> {
    let row = conn
        .query_row(
            "SELECT plan, status, renews_at FROM subscriptions WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, Option<String>>(2)?,
                ))
            },
        )
        .optional()?;

    let Some((plan, status, renews_at)) = row else {
        return Ok(None);
    };
    Ok(Some(Subscription {
        plan: plan.parse::<Plan>()?,
        status: status.parse::<SubscriptionStatus>()?,
        renews_at: renews_at.map(|ts| parse_timestamp(&ts)).transpose()?,
    }))
}

type RawAnalysis = (
    String,
    String,
    String,
    String,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    i64,
    String,
);

fn raw_analysis_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawAnalysis> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

impl TryFrom<RawAnalysis> for AnalysisRecord {
    type Error = anyhow::Error;

    fn try_from(raw: RawAnalysis) -> Result<Self> {
        let (id, user_id, url, depth, meta, content, technical, overall, created_at) = raw;
        Ok(Self {
            id,
            user_id,
            url,
            depth: depth.parse::<AnalysisDepth>()?,
            meta_score: meta.map(u8::try_from).transpose()?,
            content_score: content.map(u8::try_from).transpose()?,
            technical_score: technical.map(u8::try_from).transpose()?,
            overall_score: u8::try_from(overall)?,
            created_at: parse_timestamp(&created_at)?,
        })
    }
}

fn timestamp(dt: DateTime<Utc>) -> String {
    // Second precision keeps the stored strings lexicographically ordered.
    dt.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    Ok(DateTime::parse_from_rfc3339(raw)?.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::analyze_document;
    use chrono::TimeZone;
    use url::Url;

    fn sample_report() -> AnalysisReport {
        let html = r#"
            <html>
            <head>
                <title>A perfectly sized title</title>
                <meta name="description" content="A description that is comfortably longer than fifty characters in total.">
            </head>
            <body>
                <h1>Heading</h1><h2>Sub</h2>
                <p>Some paragraph text for the body.</p>
            </body>
            </html>
        "#;
        let url = Url::parse("https://example.com/page").unwrap();
        analyze_document(html, &url, AnalysisDepth::Complete).unwrap()
    }

    fn ts(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[test]
    fn analysis_round_trips() {
        let mut conn = open_in_memory().unwrap();
        let report = sample_report();

        let id = insert_analysis(&mut conn, "user-1", &report, ts(2026, 8, 6, 12)).unwrap();

        let record = get_analysis(&conn, &id).unwrap().expect("record exists");
        assert_eq!(record.user_id, "user-1");
        assert_eq!(record.url, "https://example.com/page");
        assert_eq!(record.depth, AnalysisDepth::Complete);
        assert_eq!(record.overall_score, report.overall_score);
        assert_eq!(
            record.meta_score,
            report.category_scores.get(&Category::Meta).copied()
        );

        let findings = findings_for(&conn, &id).unwrap();
        assert_eq!(findings, report.findings);
    }

    #[test]
    fn missing_analysis_is_none() {
        let conn = open_in_memory().unwrap();
        assert!(get_analysis(&conn, "nope").unwrap().is_none());
    }

    #[test]
    fn delete_cascades_to_findings() {
        let mut conn = open_in_memory().unwrap();
        let report = sample_report();
        let id = insert_analysis(&mut conn, "user-1", &report, ts(2026, 8, 6, 12)).unwrap();

        assert!(delete_analysis(&conn, &id).unwrap());
        assert!(get_analysis(&conn, &id).unwrap().is_none());
        assert!(findings_for(&conn, &id).unwrap().is_empty());
        assert!(!delete_analysis(&conn, &id).unwrap());
    }

    #[test]
    fn counts_analyses_in_window() {
        let mut conn = open_in_memory().unwrap();
        let report = sample_report();

        insert_analysis(&mut conn, "user-1", &report, ts(2026, 7, 31, 23)).unwrap();
        insert_analysis(&mut conn, "user-1", &report, ts(2026, 8, 1, 0)).unwrap();
        insert_analysis(&mut conn, "user-1", &report, ts(2026, 8, 6, 12)).unwrap();
        insert_analysis(&mut conn, "user-2", &report, ts(2026, 8, 6, 12)).unwrap();

        let since = ts(2026, 8, 1, 0);
        assert_eq!(count_analyses_since(&conn, "user-1", since).unwrap(), 2);
        assert_eq!(count_analyses_since(&conn, "user-2", since).unwrap(), 1);
        assert_eq!(count_analyses_since(&conn, "user-3", since).unwrap(), 0);
    }

    #[test]
    fn list_is_newest_first() {
        let mut conn = open_in_memory().unwrap();
        let report = sample_report();

        insert_analysis(&mut conn, "user-1", &report, ts(2026, 8, 1, 0)).unwrap();
        let newest = insert_analysis(&mut conn, "user-1", &report, ts(2026, 8, 6, 0)).unwrap();

        let records = list_analyses_for_user(&conn, "user-1").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].id, newest);
    }

    #[test]
    fn subscription_upsert_and_read_back() {
        let conn = open_in_memory().unwrap();

        assert!(subscription_for(&conn, "user-1").unwrap().is_none());

        let initial = Subscription {
            plan: Plan::Basic,
            status: SubscriptionStatus::Active,
            renews_at: Some(ts(2026, 9, 6, 0)),
        };
        upsert_subscription(&conn, "user-1", &initial).unwrap();
        assert_eq!(subscription_for(&conn, "user-1").unwrap(), Some(initial));

        // A later billing event upgrades the plan in place.
        let upgraded = Subscription {
            plan: Plan::Premium,
            status: SubscriptionStatus::Active,
            renews_at: Some(ts(2026, 9, 6, 0)),
        };
        upsert_subscription(&conn, "user-1", &upgraded).unwrap();
        assert_eq!(subscription_for(&conn, "user-1").unwrap(), Some(upgraded));
    }
}

//! SQL migration definitions for the FounderFuel database.
//!
//! Migrations are applied in order on database open. Each migration carries
//! its own `schema_migrations` insert so a re-open skips it.

/// A database migration with a version and SQL statements.
pub(crate) struct Migration {
    pub version: u32,
    pub description: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub(crate) fn all_migrations() -> Vec<Migration> {
    vec![
        Migration {
            version: 1,
            description: "Initial schema: scrape_results, analysis_results, repurpose_results",
            sql: r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version    INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);

-- One row per successful fetch + extract
CREATE TABLE IF NOT EXISTS scrape_results (
    id          TEXT PRIMARY KEY,
    url         TEXT NOT NULL,
    title       TEXT NOT NULL,
    description TEXT NOT NULL,
    body_text   TEXT NOT NULL,
    scraped_at  TEXT NOT NULL
);

-- Scored marketing critiques
CREATE TABLE IF NOT EXISTS analysis_results (
    id             TEXT PRIMARY KEY,
    url            TEXT NOT NULL,
    headline_score INTEGER NOT NULL CHECK (headline_score BETWEEN 1 AND 10),
    value_score    INTEGER NOT NULL CHECK (value_score BETWEEN 1 AND 10),
    cta_score      INTEGER NOT NULL CHECK (cta_score BETWEEN 1 AND 10),
    trust_score    INTEGER NOT NULL CHECK (trust_score BETWEEN 1 AND 10),
    overall_score  INTEGER NOT NULL CHECK (overall_score BETWEEN 1 AND 10),
    feedback       TEXT NOT NULL,
    analyzed_at    TEXT NOT NULL
);

-- Social / newsletter copy
CREATE TABLE IF NOT EXISTS repurpose_results (
    id             TEXT PRIMARY KEY,
    url            TEXT NOT NULL,
    title          TEXT NOT NULL,
    twitter_thread TEXT NOT NULL,
    linkedin_post  TEXT NOT NULL,
    newsletter     TEXT NOT NULL,
    created_at     TEXT NOT NULL
);

INSERT INTO schema_migrations (version) VALUES (1);
"#,
        },
        Migration {
            version: 2,
            description: "History indexes on record timestamps",
            sql: r#"
CREATE INDEX IF NOT EXISTS idx_scrape_results_scraped_at ON scrape_results(scraped_at DESC);
CREATE INDEX IF NOT EXISTS idx_analysis_results_analyzed_at ON analysis_results(analyzed_at DESC);
CREATE INDEX IF NOT EXISTS idx_repurpose_results_created_at ON repurpose_results(created_at DESC);

INSERT INTO schema_migrations (version) VALUES (2);
"#,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn versions_are_strictly_ascending() {
        let versions: Vec<u32> = all_migrations().iter().map(|m| m.version).collect();
        assert!(versions.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(versions.first(), Some(&1));
    }

    #[test]
    fn each_migration_records_itself() {
        for m in all_migrations() {
            let marker = format!("INSERT INTO schema_migrations (version) VALUES ({});", m.version);
            assert!(m.sql.contains(&marker), "migration v{} missing marker", m.version);
        }
    }
}

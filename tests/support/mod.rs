//! Seeded `GOLD` schema shared by the behavior tests.

use std::path::Path;

use duckdb::Connection;
use fraudwatch_warehouse::{ReadThroughQueryService, ReportCatalog, WarehouseConfig};
use tempfile::TempDir;

const SCHEMA: &str = r#"
CREATE SCHEMA GOLD;

CREATE TABLE GOLD.DIM_CUSTOMER (
    CUSTOMER_KEY INTEGER, CUSTOMER_ID VARCHAR, RISK_SCORE INTEGER,
    RISK_CATEGORY VARCHAR, KYC_STATUS VARCHAR, SEGMENT VARCHAR
);
CREATE TABLE GOLD.DIM_ACCOUNT (ACCOUNT_KEY INTEGER, ACCOUNT_TYPE VARCHAR);
CREATE TABLE GOLD.DIM_LOCATION (LOCATION_KEY INTEGER, LOCATION VARCHAR, REGION VARCHAR);
CREATE TABLE GOLD.DIM_ALERT_TYPE (
    ALERT_TYPE_KEY INTEGER, ALERT_TYPE VARCHAR, ALERT_SEVERITY VARCHAR, ALERT_CATEGORY VARCHAR
);
CREATE TABLE GOLD.FACT_TRANSACTIONS (
    TXN_ID VARCHAR, TXN_TIMESTAMP TIMESTAMP, CUSTOMER_KEY INTEGER, ACCOUNT_KEY INTEGER,
    LOCATION_KEY INTEGER, AMOUNT DOUBLE, HAS_ALERT BOOLEAN, ALERT_COUNT INTEGER
);
CREATE TABLE GOLD.FACT_ALERTS (
    ALERT_ID VARCHAR, ALERT_TIMESTAMP TIMESTAMP, CUSTOMER_KEY INTEGER, ALERT_TYPE_KEY INTEGER,
    TRANSACTION_AMOUNT DOUBLE, CUSTOMER_RISK_SCORE INTEGER
);

INSERT INTO GOLD.DIM_CUSTOMER VALUES
    (1, 'C001', 88, 'High Risk', 'Pending', 'Retail'),
    (2, 'C002', 72, 'High Risk', 'Verified', 'Premium'),
    (3, 'C003', 41, 'Medium Risk', 'Verified', 'Retail'),
    (4, 'C004', 64, 'Low Risk', 'Expired', 'Business');
INSERT INTO GOLD.DIM_ACCOUNT VALUES (1, 'Savings'), (2, 'Current');
INSERT INTO GOLD.DIM_LOCATION VALUES
    (1, 'Mumbai', 'West'), (2, 'Delhi', 'North'), (3, 'Chennai', 'South');
INSERT INTO GOLD.DIM_ALERT_TYPE VALUES
    (1, 'High Value', 'Critical', 'Amount'),
    (2, 'Rapid Velocity', 'High', 'Behaviour'),
    (3, 'Foreign Location', 'Medium', 'Location'),
    (4, 'Multiple Failures', 'Low', 'Authentication');

INSERT INTO GOLD.FACT_TRANSACTIONS VALUES
    ('T1', TIMESTAMP '2026-01-03 02:15:00', 1, 1, 1, 75000, true, 2),
    ('T2', TIMESTAMP '2026-01-03 11:00:00', 3, 2, 2, 1200, false, 0),
    ('T3', TIMESTAMP '2026-01-04 23:30:00', 2, 1, 3, 9000, true, 1),
    ('T4', TIMESTAMP '2026-01-05 10:00:00', 4, 2, 1, 300, false, 0),
    ('T5', TIMESTAMP '2026-01-05 14:45:00', 1, 2, 2, 45000, true, 1),
    ('T6', TIMESTAMP '2026-01-06 09:05:00', 3, 1, 3, 5200, false, 0),
    ('T7', TIMESTAMP '2026-01-06 19:20:00', 2, 2, 1, 15000, false, 0),
    ('T8', TIMESTAMP '2026-01-07 03:40:00', 4, 1, 2, 60000, true, 3);

INSERT INTO GOLD.FACT_ALERTS VALUES
    ('A1', TIMESTAMP '2026-01-03 02:16:00', 1, 1, 75000, 88),
    ('A2', TIMESTAMP '2026-01-04 23:31:00', 2, 2, 9000, 72),
    ('A3', TIMESTAMP '2026-01-05 14:46:00', 1, 3, 45000, 85),
    ('A4', TIMESTAMP '2026-01-07 03:41:00', 4, 1, 60000, 64),
    ('A5', TIMESTAMP '2026-01-07 03:42:00', 4, 4, 60000, 64);

CREATE VIEW GOLD.VW_TABLEAU_FRAUD_SUMMARY AS
    SELECT 'Total Transactions' AS METRIC_NAME, CAST(COUNT(*) AS DOUBLE) AS METRIC_VALUE
    FROM GOLD.FACT_TRANSACTIONS
    UNION ALL
    SELECT 'Flagged Transactions', CAST(COUNT(*) FILTER (WHERE HAS_ALERT) AS DOUBLE)
    FROM GOLD.FACT_TRANSACTIONS
    UNION ALL
    SELECT 'Fraud Detection Rate', 100.0 * COUNT(*) FILTER (WHERE HAS_ALERT) / COUNT(*)
    FROM GOLD.FACT_TRANSACTIONS
    UNION ALL
    SELECT 'High Risk Customers', CAST(COUNT(*) AS DOUBLE)
    FROM GOLD.DIM_CUSTOMER WHERE RISK_CATEGORY = 'High Risk';

CREATE VIEW GOLD.VW_TABLEAU_DAILY_TRENDS AS
    SELECT CAST(TXN_TIMESTAMP AS DATE) AS DATE_VALUE,
           dayofweek(TXN_TIMESTAMP) IN (0, 6) AS IS_WEEKEND,
           COUNT(*) AS TRANSACTION_COUNT,
           COUNT(*) FILTER (WHERE HAS_ALERT) AS FLAGGED_COUNT
    FROM GOLD.FACT_TRANSACTIONS
    GROUP BY 1, 2;

CREATE VIEW GOLD.VW_TABLEAU_ALERT_DISTRIBUTION AS
    SELECT dat.ALERT_TYPE, COUNT(*) AS ALERT_COUNT
    FROM GOLD.FACT_ALERTS fa
    JOIN GOLD.DIM_ALERT_TYPE dat ON fa.ALERT_TYPE_KEY = dat.ALERT_TYPE_KEY
    GROUP BY 1;

CREATE VIEW GOLD.VW_TABLEAU_CUSTOMER_SEGMENTS AS
    SELECT dc.SEGMENT, COUNT(DISTINCT dc.CUSTOMER_KEY) AS CUSTOMER_COUNT,
           100.0 * COUNT(*) FILTER (WHERE ft.HAS_ALERT) / COUNT(*) AS FRAUD_RATE
    FROM GOLD.FACT_TRANSACTIONS ft
    JOIN GOLD.DIM_CUSTOMER dc ON ft.CUSTOMER_KEY = dc.CUSTOMER_KEY
    GROUP BY 1;

CREATE VIEW GOLD.VW_TABLEAU_GEOGRAPHIC_RISK AS
    SELECT dl.LOCATION, dl.REGION,
           COUNT(*) AS TRANSACTION_COUNT,
           COUNT(*) FILTER (WHERE ft.HAS_ALERT) AS FLAGGED_COUNT,
           SUM(ft.AMOUNT) AS TOTAL_VALUE,
           100.0 * COUNT(*) FILTER (WHERE ft.HAS_ALERT) / COUNT(*) AS FRAUD_RATE
    FROM GOLD.FACT_TRANSACTIONS ft
    JOIN GOLD.DIM_LOCATION dl ON ft.LOCATION_KEY = dl.LOCATION_KEY
    GROUP BY 1, 2;

CREATE VIEW GOLD.VW_TABLEAU_TIME_PATTERNS AS
    SELECT hour(TXN_TIMESTAMP) AS TXN_HOUR,
           CASE
               WHEN hour(TXN_TIMESTAMP) < 6 THEN 'Night'
               WHEN hour(TXN_TIMESTAMP) < 12 THEN 'Morning'
               WHEN hour(TXN_TIMESTAMP) < 18 THEN 'Afternoon'
               ELSE 'Evening'
           END AS TIME_PERIOD,
           COUNT(*) AS TRANSACTION_COUNT,
           COUNT(*) FILTER (WHERE HAS_ALERT) AS FLAGGED_COUNT,
           100.0 * COUNT(*) FILTER (WHERE HAS_ALERT) / COUNT(*) AS FRAUD_RATE
    FROM GOLD.FACT_TRANSACTIONS
    GROUP BY 1, 2;

CREATE VIEW GOLD.VW_KYC_RISK_ANALYSIS AS
    SELECT dc.RISK_CATEGORY, dc.KYC_STATUS,
           COUNT(DISTINCT dc.CUSTOMER_KEY) AS CUSTOMER_COUNT,
           COUNT(ft.TXN_ID) AS TOTAL_TRANSACTIONS,
           COUNT(ft.TXN_ID) FILTER (WHERE ft.HAS_ALERT) AS FLAGGED_TRANSACTIONS,
           100.0 * COUNT(ft.TXN_ID) FILTER (WHERE ft.HAS_ALERT) / COUNT(ft.TXN_ID) AS FRAUD_RATE_PCT
    FROM GOLD.DIM_CUSTOMER dc
    LEFT JOIN GOLD.FACT_TRANSACTIONS ft ON ft.CUSTOMER_KEY = dc.CUSTOMER_KEY
    GROUP BY 1, 2;
"#;

/// A temporary warehouse holding the seeded `GOLD` schema.
pub struct Fixture {
    _dir: TempDir,
    pub config: WarehouseConfig,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let database = dir.path().join("warehouse.duckdb");
        seed(&database);

        let config = WarehouseConfig {
            database,
            ..WarehouseConfig::default()
        };
        Self { _dir: dir, config }
    }

    pub fn service(&self) -> ReadThroughQueryService {
        ReadThroughQueryService::open(&self.config).expect("service")
    }

    pub fn catalog(&self) -> ReportCatalog {
        ReportCatalog::new(self.config.schema.clone()).expect("catalog")
    }
}

fn seed(database: &Path) {
    let connection = Connection::open(database).expect("open fixture database");
    connection.execute_batch(SCHEMA).expect("seed GOLD schema");
}

//! Built-in classifier catalog (spec §3, §4.1): the identifiers and
//! credential shapes a scan recognizes out of the box, grouped the way the
//! original ships them — structured personal/financial identifiers, then
//! credential-shaped secrets.

use warden_core::{Classifier, ClassifierCategory, ClassifierKind, EngineKind, Sensitivity};

/// RFC 3339 timestamp of this catalog's last revision. A chunk whose
/// `latest_data_type` predates this is a rescan candidate (spec §4.5
/// `rescan_by_data_type`): its findings were computed against an older
/// version of the catalog below.
pub const CATALOG_VERSION: &str = "2026-01-01T00:00:00Z";

fn c(
    id: i64,
    name: &str,
    engine: EngineKind,
    pattern: &str,
    sensitivity: Sensitivity,
) -> Classifier {
    Classifier::new(
        id,
        name,
        engine,
        vec![pattern.to_string()],
        ClassifierCategory::Include,
        ClassifierKind::Data,
        vec![],
        sensitivity,
    )
    .expect("builtin catalog entries satisfy the Classifier::new invariants")
}

/// The default catalog: structured identifiers run through the mass-regex
/// engine (they're simple, fixed-shape, and there are enough of them that
/// one screening pass pays for itself), credential shapes mostly run
/// through RE2, and the one pattern that needs a lookahead runs through the
/// backtracking engine.
pub fn builtin_catalog() -> Vec<Classifier> {
    vec![
        // Structured personal / financial identifiers.
        c(1, "IN_PAN", EngineKind::Hyperscan, r"[A-Z]{5}[0-9]{4}[A-Z]{1}", Sensitivity::High),
        c(2, "IN_AADHAR", EngineKind::Hyperscan, r"\d{4}\s?\d{4}\s?\d{4}", Sensitivity::Critical),
        c(
            3,
            "CREDIT_CARD",
            EngineKind::Hyperscan,
            r"\b(?:\d[ -]*?){13,16}\b",
            Sensitivity::Critical,
        ),
        c(
            4,
            "EMAIL_ADDRESS",
            EngineKind::Re2,
            r"[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+",
            Sensitivity::Medium,
        ),
        c(
            5,
            "IBAN_CODE",
            EngineKind::Hyperscan,
            r"[A-Z]{2}\d{2}[A-Z0-9]{10,30}",
            Sensitivity::High,
        ),
        c(
            6,
            "CRYPTO",
            EngineKind::Hyperscan,
            r"\b(bc1|[13])[a-zA-HJ-NP-Z0-9]{25,39}\b",
            Sensitivity::High,
        ),
        c(7, "US_SSN", EngineKind::Hyperscan, r"\d{3}-\d{2}-\d{4}", Sensitivity::Critical),
        c(8, "UK_NHS", EngineKind::Hyperscan, r"\d{3}\s?\d{3}\s?\d{4}", Sensitivity::High),
        c(9, "US_ITIN", EngineKind::Hyperscan, r"9\d{2}-\d{2}-\d{4}", Sensitivity::Critical),
        c(
            10,
            "US_PASSPORT",
            EngineKind::Re2,
            r"\b[A-Z][0-9]{8}\b",
            Sensitivity::High,
        ),
        c(
            11,
            "US_DRIVER_LICENSE",
            EngineKind::Re2,
            r"\b[A-Z]{1,2}[0-9]{5,8}\b",
            Sensitivity::Medium,
        ),
        c(
            12,
            "MEDICAL_LICENSE",
            EngineKind::Re2,
            r"\b[A-Z]{2}\d{6,8}\b",
            Sensitivity::High,
        ),
        c(
            13,
            "US_BANK_NUMBER",
            EngineKind::Hyperscan,
            r"\b\d{8,17}\b",
            Sensitivity::High,
        ),
        // Credential-shaped secrets.
        c(
            14,
            "AWS_CREDENTIALS",
            EngineKind::Re2,
            r"(?:AKIA|ASIA)[0-9A-Z]{16}",
            Sensitivity::Critical,
        ),
        c(
            15,
            "AZURE_CREDENTIALS",
            EngineKind::Re2,
            r#"(?i)azure.{0,20}['"][0-9a-zA-Z/+]{40,88}['"]"#,
            Sensitivity::Critical,
        ),
        c(
            16,
            "GITHUB_CREDENTIALS",
            EngineKind::Re2,
            r"gh[pousr]_[A-Za-z0-9]{36,255}",
            Sensitivity::Critical,
        ),
        c(
            17,
            "STRIPE_CREDENTIALS",
            EngineKind::Re2,
            r"sk_(live|test)_[0-9a-zA-Z]{24,99}",
            Sensitivity::Critical,
        ),
        c(
            18,
            "SSH_KEYS",
            EngineKind::Re,
            r"-----BEGIN (?=.*PRIVATE)[A-Z ]*PRIVATE KEY-----",
            Sensitivity::Critical,
        ),
        c(
            19,
            "TWILIO_CREDENTIALS",
            EngineKind::Re2,
            r"SK[0-9a-fA-F]{32}",
            Sensitivity::Critical,
        ),
        c(
            20,
            "CELERY_CREDENTIALS",
            EngineKind::Re2,
            r#"(?i)celery.{0,20}broker.{0,20}['"](amqp|redis)://[^'"]+['"]"#,
            Sensitivity::High,
        ),
        c(
            21,
            "SENDGRID_CREDENTIALS",
            EngineKind::Re2,
            r"SG\.[0-9A-Za-z_-]{22}\.[0-9A-Za-z_-]{43}",
            Sensitivity::Critical,
        ),
        c(
            22,
            "GCP_CREDENTIALS",
            EngineKind::Re2,
            r#""type":\s*"service_account""#,
            Sensitivity::Critical,
        ),
        c(
            23,
            "AUTH0_CREDENTIALS",
            EngineKind::Re2,
            r#"(?i)auth0.{0,20}['"][0-9a-zA-Z_-]{32,64}['"]"#,
            Sensitivity::Critical,
        ),
        c(
            24,
            "SNOWFLAKE_CREDENTIALS",
            EngineKind::Re2,
            r"(?i)snowflakecomputing\.com",
            Sensitivity::High,
        ),
        c(
            25,
            "PRIVATE_CREDENTIALS",
            EngineKind::Re,
            r#"(?i)(?=.*(password|secret|token))[a-z_]*\s*[:=]\s*['"][^'"]{8,}['"]"#,
            Sensitivity::Critical,
        ),
        c(
            26,
            "OPENAI_KEY",
            EngineKind::Re2,
            r"sk-[A-Za-z0-9]{20,}T3BlbkFJ[A-Za-z0-9]{20,}",
            Sensitivity::Critical,
        ),
        c(
            27,
            "IP_ADDRESSES",
            EngineKind::Hyperscan,
            r"\b(?:\d{1,3}\.){3}\d{1,3}\b",
            Sensitivity::Low,
        ),
        c(
            28,
            "INSURANCE_INFORMATION",
            EngineKind::Re2,
            r"(?i)\b(policy|member)\s*(number|id)\s*[:#]?\s*[A-Z0-9-]{6,}\b",
            Sensitivity::High,
        ),
    ]
}

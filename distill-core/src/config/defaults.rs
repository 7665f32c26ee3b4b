//! Default tuning constants. Every value here is reachable through
//! `DistillConfig`, since the right values are corpus-dependent.

/// Lexical similarity at or above which a pair is a duplicate without an
/// embedding call.
pub const DEFAULT_SKIP_SEMANTIC_THRESHOLD: f64 = 0.95;

/// Lexical similarity below which a pair is rejected without an embedding
/// call. Applied per type; this is the flat default. Kept low: paraphrases
/// of one object in different words score poorly on lexical measures and
/// must still reach the semantic stage.
pub const DEFAULT_LEXICAL_FLOOR: f64 = 0.15;

/// Per-type semantic thresholds. Aggressive for high-redundancy, low-harm
/// types; conservative for high-harm or rare types.
pub const DEFAULT_SEMANTIC_PAIN_POINT: f64 = 0.70;
pub const DEFAULT_SEMANTIC_PROCESS: f64 = 0.75;
pub const DEFAULT_SEMANTIC_SYSTEM: f64 = 0.75;
pub const DEFAULT_SEMANTIC_KPI: f64 = 0.85;
pub const DEFAULT_SEMANTIC_AUTOMATION_CANDIDATE: f64 = 0.75;
pub const DEFAULT_SEMANTIC_TEAM_STRUCTURE: f64 = 0.90;

/// Bounded candidate window per entity during duplicate detection.
pub const DEFAULT_MAX_CANDIDATES: usize = 50;

/// Consensus formula defaults. The divisor saturates confidence near 1.0
/// for well-corroborated facts at the expected mention rate.
pub const DEFAULT_CONSENSUS_DIVISOR: f64 = 5.0;
pub const DEFAULT_SINGLE_SOURCE_PENALTY: f64 = 0.2;
pub const DEFAULT_CONTRADICTION_PENALTY: f64 = 0.2;
pub const DEFAULT_AGREEMENT_BONUS: f64 = 0.1;

/// Pattern recognition defaults.
pub const DEFAULT_RECURRING_FLOOR: usize = 3;
pub const DEFAULT_PROBLEMATIC_LINK_FLOOR: usize = 5;
pub const DEFAULT_HIGH_PRIORITY_SHARE: f64 = 0.30;

/// Embedding provider defaults.
pub const DEFAULT_EMBEDDING_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_EMBEDDING_MAX_RETRIES: u32 = 2;
pub const DEFAULT_CACHE_TTL_SECS: u64 = 86_400;
pub const DEFAULT_CACHE_CAPACITY: u64 = 100_000;

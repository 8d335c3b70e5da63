pub const SCHEMA_VERSION: i32 = 2;

pub const SCHEMA_V1: &str = r#"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    id INTEGER PRIMARY KEY,
    version INTEGER NOT NULL
);

-- The single local user
CREATE TABLE IF NOT EXISTS users (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    given_name TEXT,
    family_name TEXT
);

-- Catalogs: global reference tables, seeded once, never deleted by the app.
-- Normalized-name uniqueness is installed by the dedup routines, not here,
-- so the one-time cleanup can run against pre-existing data first.
CREATE TABLE IF NOT EXISTS allergies (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    kind TEXT
);

CREATE TABLE IF NOT EXISTS conditions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
);

-- Association tables: presence = active for this user
CREATE TABLE IF NOT EXISTS user_allergies (
    user_id INTEGER NOT NULL,
    allergy_id INTEGER NOT NULL,
    severity TEXT,
    reaction TEXT,
    PRIMARY KEY (user_id, allergy_id),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (allergy_id) REFERENCES allergies(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS user_conditions (
    user_id INTEGER NOT NULL,
    condition_id INTEGER NOT NULL,
    diagnosed_on TEXT,
    status TEXT,
    PRIMARY KEY (user_id, condition_id),
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE,
    FOREIGN KEY (condition_id) REFERENCES conditions(id) ON DELETE CASCADE
);

-- One-to-one demographics
CREATE TABLE IF NOT EXISTS demographics (
    user_id INTEGER PRIMARY KEY,
    age INTEGER,
    sex TEXT CHECK (sex IN ('M','F','X')),
    pregnant INTEGER CHECK (pregnant IN (0,1)) DEFAULT 0,
    lactating INTEGER CHECK (lactating IN (0,1)) DEFAULT 0,
    weight_kg REAL,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);

-- Conversation log
CREATE TABLE IF NOT EXISTS conversations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id INTEGER NOT NULL,
    started_at TEXT NOT NULL,
    reason TEXT NOT NULL,
    status TEXT NOT NULL,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);
CREATE INDEX IF NOT EXISTS idx_conversation_user_started
    ON conversations(user_id, started_at);

CREATE TABLE IF NOT EXISTS messages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    conversation_id INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    role TEXT NOT NULL CHECK (role IN ('user','assistant')),
    content TEXT NOT NULL,
    FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE
);
CREATE INDEX IF NOT EXISTS idx_message_conversation
    ON messages(conversation_id);

-- Screening audit log
CREATE TABLE IF NOT EXISTS recommendations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    conversation_id INTEGER NOT NULL,
    user_id INTEGER NOT NULL,
    created_at TEXT NOT NULL,
    description TEXT NOT NULL,
    severity TEXT NOT NULL,
    action TEXT NOT NULL,
    source TEXT NOT NULL,
    FOREIGN KEY (conversation_id) REFERENCES conversations(id) ON DELETE CASCADE,
    FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
);
CREATE INDEX IF NOT EXISTS idx_recommendation_conversation
    ON recommendations(conversation_id);
CREATE INDEX IF NOT EXISTS idx_recommendation_user
    ON recommendations(user_id);

-- Health centers
CREATE TABLE IF NOT EXISTS health_units (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    address TEXT NOT NULL DEFAULT '',
    phone TEXT NOT NULL DEFAULT '',
    kind TEXT NOT NULL DEFAULT 'centro'
);

CREATE TABLE IF NOT EXISTS clinic_locations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    unit_id INTEGER NOT NULL,
    label TEXT NOT NULL DEFAULT '',
    lat REAL,
    lon REAL,
    status TEXT NOT NULL DEFAULT 'active',
    FOREIGN KEY (unit_id) REFERENCES health_units(id) ON DELETE CASCADE
);
CREATE INDEX IF NOT EXISTS idx_clinic_location_unit
    ON clinic_locations(unit_id);
"#;

/// V2 migration: height column for demographics, added after the initial
/// deployment. Existing rows keep NULL until the next upsert.
pub const MIGRATION_V2: &str = r#"
ALTER TABLE demographics ADD COLUMN height_cm REAL;
"#;

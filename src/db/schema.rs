/// Tables of a project store as of the first versioned release.
///
/// Every statement is `IF NOT EXISTS` so stores written before versioning
/// existed are adopted as they are.
pub const PROJECT_SCHEMA: &str = r#"
-- Project metadata: always exactly one row (id = 1)
CREATE TABLE IF NOT EXISTS Project_Info (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    title TEXT NOT NULL,
    logline TEXT DEFAULT '',
    synopsis TEXT DEFAULT '',
    intent TEXT DEFAULT '',
    review_notes TEXT DEFAULT '',
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT
);

-- Imported files, one row per distinct content hash
CREATE TABLE IF NOT EXISTS Assets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    kind TEXT,
    original_path TEXT,
    project_path TEXT,        -- Relative to the store's directory
    filename TEXT,
    ext TEXT,
    width INTEGER,
    height INTEGER,
    duration_sec REAL,
    hash_sha256 TEXT,
    tags TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    thumbnail_path TEXT       -- Relative to the store's directory
);

CREATE UNIQUE INDEX IF NOT EXISTS idx_assets_hash ON Assets(hash_sha256);

CREATE TABLE IF NOT EXISTS Characters (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    age TEXT,
    job TEXT,
    personality TEXT,
    goal TEXT,
    conflict TEXT,
    design_prompt TEXT,
    image_asset_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT,
    FOREIGN KEY (image_asset_id) REFERENCES Assets(id) ON DELETE SET NULL
);

CREATE TABLE IF NOT EXISTS Scenes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    number INTEGER,
    name TEXT,
    location TEXT,
    time_of_day TEXT,
    summary TEXT,
    sort_index INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT
);

CREATE TABLE IF NOT EXISTS Shots (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    scene_id INTEGER NOT NULL,
    code TEXT,
    description TEXT,
    shot_type TEXT,
    angle TEXT,
    movement TEXT,
    lens TEXT,
    lighting TEXT,
    image_prompt TEXT,
    video_prompt TEXT,
    storyboard_asset_id INTEGER,
    sort_index INTEGER,
    duration_sec REAL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT,
    FOREIGN KEY (scene_id) REFERENCES Scenes(id) ON DELETE CASCADE,
    FOREIGN KEY (storyboard_asset_id) REFERENCES Assets(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_shots_scene ON Shots(scene_id);

CREATE TABLE IF NOT EXISTS Audio_Cues (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    shot_id INTEGER NOT NULL,
    cue_type TEXT,
    style_prompt TEXT,
    lyrics_prompt TEXT,
    start_offset_sec REAL,
    duration_sec REAL,
    asset_id INTEGER,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT,
    FOREIGN KEY (shot_id) REFERENCES Shots(id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS FinalImages (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    scene_id INTEGER NOT NULL,
    description TEXT DEFAULT '',
    asset_id INTEGER NULL,
    sort_index INTEGER,
    updated_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (scene_id) REFERENCES Scenes(id) ON DELETE CASCADE,
    FOREIGN KEY (asset_id) REFERENCES Assets(id) ON DELETE SET NULL
);

CREATE INDEX IF NOT EXISTS idx_final_images_scene ON FinalImages(scene_id);

-- Named text/JSON documents ("logline", "visual_prompt", ...)
CREATE TABLE IF NOT EXISTS Documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    key TEXT NOT NULL UNIQUE,
    format TEXT NOT NULL CHECK (format IN ('json', 'text')),
    content TEXT NOT NULL,
    updated_at TEXT DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_documents_key ON Documents(key);

-- Boards are single-row documents (id = 1)
CREATE TABLE IF NOT EXISTS AudioBoard (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    format TEXT NOT NULL CHECK (format IN ('json', 'text')),
    content TEXT NOT NULL,
    updated_at TEXT DEFAULT (datetime('now'))
);

INSERT OR IGNORE INTO AudioBoard(id, format, content) VALUES (1, 'json', '{}');

CREATE TABLE IF NOT EXISTS CinematicBoard (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    format TEXT NOT NULL CHECK (format IN ('json', 'text')),
    content TEXT NOT NULL,
    updated_at TEXT DEFAULT (datetime('now'))
);

INSERT OR IGNORE INTO CinematicBoard(id, format, content) VALUES (1, 'json', '{}');
"#;

/// Bookkeeping for applied migrations.
pub const MIGRATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

/// The per-installation index of known projects.
pub const LIBRARY_SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS projects (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    project_path TEXT NOT NULL UNIQUE,
    tags TEXT DEFAULT '',
    thumbnail TEXT,
    last_opened_at TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    db_version INTEGER,
    archived INTEGER DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_projects_title ON projects(title);
CREATE INDEX IF NOT EXISTS idx_projects_tags ON projects(tags);
"#;

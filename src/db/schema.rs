//! Database schema and migrations for ijara.
//!
//! Migrations are applied in order when the database is opened. The
//! schema_version table tracks which ones have run.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: Reference data
    r#"
CREATE TABLE jins (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name_uz     TEXT NOT NULL,
    name_ru     TEXT NOT NULL
);

CREATE TABLE categories (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name_uz     TEXT NOT NULL,
    name_ru     TEXT NOT NULL
);

CREATE TABLE universities (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name_uz     TEXT NOT NULL,
    name_ru     TEXT NOT NULL,
    acronym_uz  TEXT,
    acronym_ru  TEXT,
    longitude   REAL,
    latitude    REAL
);

CREATE TABLE faculties (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    name_uz         TEXT NOT NULL,
    name_ru         TEXT NOT NULL,
    university_id   INTEGER NOT NULL REFERENCES universities(id),
    longitude       REAL,
    latitude        REAL
);

CREATE INDEX idx_faculties_university ON faculties(university_id);

CREATE TABLE regions (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name_uz     TEXT NOT NULL,
    name_ru     TEXT NOT NULL
);

CREATE TABLE districts (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name_uz     TEXT NOT NULL,
    name_ru     TEXT NOT NULL,
    region_id   INTEGER NOT NULL REFERENCES regions(id)
);

CREATE INDEX idx_districts_region ON districts(region_id);

CREATE TABLE staff_roles (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE
);

INSERT INTO jins (name_uz, name_ru) VALUES ('Erkak', 'Мужской');
INSERT INTO jins (name_uz, name_ru) VALUES ('Ayol', 'Женский');

INSERT INTO categories (name_uz, name_ru) VALUES ('Kvartira', 'Квартира');
INSERT INTO categories (name_uz, name_ru) VALUES ('Hovli', 'Дом');
INSERT INTO categories (name_uz, name_ru) VALUES ('Xona', 'Комната');
INSERT INTO categories (name_uz, name_ru) VALUES ('Yotoqxona', 'Общежитие');

INSERT INTO staff_roles (name) VALUES ('admin');
INSERT INTO staff_roles (name) VALUES ('moderator');
"#,
    // v2: Identity tables
    r#"
CREATE TABLE students (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    firstname       TEXT NOT NULL,
    lastname        TEXT NOT NULL,
    phone           TEXT NOT NULL UNIQUE,
    jins_id         INTEGER NOT NULL REFERENCES jins(id),
    university_id   INTEGER REFERENCES universities(id),
    faculty_id      INTEGER REFERENCES faculties(id),
    grade           INTEGER,
    district_id     INTEGER REFERENCES districts(id),
    password        TEXT NOT NULL,           -- Argon2 hash
    image           TEXT,                    -- image hashcode
    invisible       INTEGER NOT NULL DEFAULT 0,
    register_at     TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE renters (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    firstname       TEXT NOT NULL,
    lastname        TEXT NOT NULL,
    phone           TEXT NOT NULL UNIQUE,
    password        TEXT NOT NULL,           -- Argon2 hash
    image           TEXT,                    -- image hashcode
    register_at     TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE staff (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    firstname       TEXT NOT NULL,
    lastname        TEXT NOT NULL,
    phone           TEXT NOT NULL UNIQUE,
    email           TEXT NOT NULL UNIQUE COLLATE NOCASE,
    password        TEXT NOT NULL,           -- Argon2 hash
    role_id         INTEGER NOT NULL REFERENCES staff_roles(id),
    registered_at   TEXT NOT NULL DEFAULT (datetime('now')),
    last_login      TEXT
);
"#,
    // v3: Listings and everything hanging off them
    r#"
CREATE TABLE rents (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    name                TEXT NOT NULL,
    description         TEXT,
    category_id         INTEGER NOT NULL REFERENCES categories(id),
    contract            INTEGER NOT NULL DEFAULT 0,
    broker              INTEGER NOT NULL DEFAULT 0,
    room_count          INTEGER NOT NULL DEFAULT 1,
    total_price         REAL NOT NULL DEFAULT 0,
    student_jins_id     INTEGER NOT NULL REFERENCES jins(id),
    student_count       INTEGER NOT NULL DEFAULT 1,
    renter_id           INTEGER NOT NULL REFERENCES renters(id),
    location            TEXT,
    longitude           REAL,
    latitude            REAL,
    wifi                INTEGER NOT NULL DEFAULT 0,
    conditioner         INTEGER NOT NULL DEFAULT 0,
    washing_machine     INTEGER NOT NULL DEFAULT 0,
    tv                  INTEGER NOT NULL DEFAULT 0,
    refrigerator        INTEGER NOT NULL DEFAULT 0,
    furniture           INTEGER NOT NULL DEFAULT 0,
    other_convenience   TEXT,
    created_at          TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at          TEXT
);

CREATE INDEX idx_rents_renter ON rents(renter_id);
CREATE INDEX idx_rents_jins_created ON rents(student_jins_id, created_at);

CREATE TABLE images (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    rent_id     INTEGER REFERENCES rents(id),   -- NULL for profile photos
    url         TEXT NOT NULL,
    hashcode    TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_images_rent ON images(rent_id);

CREATE TABLE rates (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES students(id),
    rent_id     INTEGER NOT NULL REFERENCES rents(id),
    rate        INTEGER NOT NULL CHECK (rate BETWEEN 1 AND 5),
    comment     TEXT,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX idx_rates_rent ON rates(rent_id);

CREATE TABLE wishlists (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id     INTEGER NOT NULL REFERENCES students(id),
    rent_id     INTEGER NOT NULL REFERENCES rents(id),
    created_at  TEXT NOT NULL DEFAULT (datetime('now')),
    UNIQUE(user_id, rent_id)
);
"#,
];

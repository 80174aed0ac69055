//! # PostgreSQL
//!
//! All persistent data lives in two tables, `users` and `properties`, with a
//! one-to-many ownership relation enforced by a foreign key.
//!
//! The schema is applied on startup and every statement is idempotent, so a
//! fresh container and a long-lived database both come up the same way.
use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};

use super::config::Config;

const SCHEMA: &str = r#"
DO $$ BEGIN
    CREATE TYPE user_role AS ENUM ('user', 'admin');
EXCEPTION WHEN duplicate_object THEN NULL;
END $$;

DO $$ BEGIN
    CREATE TYPE property_type AS ENUM ('apartment', 'house', 'studio', 'room');
EXCEPTION WHEN duplicate_object THEN NULL;
END $$;

DO $$ BEGIN
    CREATE TYPE property_status AS ENUM ('Available', 'Occupied', 'Maintenance', 'Pending');
EXCEPTION WHEN duplicate_object THEN NULL;
END $$;

CREATE TABLE IF NOT EXISTS users (
    id SERIAL PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    username TEXT NOT NULL UNIQUE,
    email TEXT NOT NULL UNIQUE,
    password TEXT NOT NULL,
    gender TEXT NOT NULL,
    role user_role NOT NULL DEFAULT 'user',
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    last_login TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE TABLE IF NOT EXISTS properties (
    id SERIAL PRIMARY KEY,
    title TEXT NOT NULL,
    location TEXT NOT NULL,
    price DOUBLE PRECISION NOT NULL,
    type property_type NOT NULL,
    bedrooms INT NOT NULL,
    bathrooms INT NOT NULL,
    max_occupancy INT NOT NULL,
    description TEXT NOT NULL,
    image TEXT,
    images JSONB NOT NULL DEFAULT '[]',
    house_rules JSONB NOT NULL DEFAULT '[]',
    status property_status NOT NULL DEFAULT 'Available',
    is_active BOOLEAN NOT NULL DEFAULT TRUE,
    owner_id INT NOT NULL REFERENCES users (id),
    view_count INT NOT NULL DEFAULT 0,
    featured_until TIMESTAMPTZ,
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);

CREATE INDEX IF NOT EXISTS idx_properties_location ON properties (location);
CREATE INDEX IF NOT EXISTS idx_properties_type ON properties (type);
CREATE INDEX IF NOT EXISTS idx_properties_price ON properties (price);
CREATE INDEX IF NOT EXISTS idx_properties_status ON properties (status);
CREATE INDEX IF NOT EXISTS idx_properties_owner_id ON properties (owner_id);
"#;

pub async fn init_postgres(config: &Config) -> PgPool {
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .min_connections(config.db_min_connections)
        .acquire_timeout(Duration::from_secs(config.db_acquire_timeout_secs))
        .idle_timeout(Duration::from_secs(config.db_idle_timeout_secs))
        .connect(&config.database_url())
        .await
        .unwrap();

    sync_schema(&pool).await;

    pool
}

pub async fn sync_schema(pool: &PgPool) {
    sqlx::raw_sql(SCHEMA).execute(pool).await.unwrap();
}

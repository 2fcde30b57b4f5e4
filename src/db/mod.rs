pub mod models;

use std::path::Path;

use chrono::{NaiveDate, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use uuid::Uuid;

use crate::error::AppError;

pub use models::{Generation, HistoryEntry, Payment, Tier, User, UserSummary, Voice, VoiceKind};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            BLOB PRIMARY KEY,
    username      TEXT NOT NULL UNIQUE,
    email         TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL,
    tier          TEXT NOT NULL DEFAULT 'Basic',
    used_today    INTEGER NOT NULL DEFAULT 0,
    usage_date    TEXT NOT NULL,
    created_at    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS voices (
    id           BLOB PRIMARY KEY,
    owner_id     BLOB REFERENCES users(id),
    name         TEXT NOT NULL,
    kind         TEXT NOT NULL,
    engine_voice TEXT NOT NULL,
    pitch_shift  INTEGER NOT NULL DEFAULT 0,
    sample_ref   TEXT,
    created_at   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS generations (
    id         BLOB PRIMARY KEY,
    user_id    BLOB NOT NULL REFERENCES users(id),
    voice_id   BLOB NOT NULL REFERENCES voices(id),
    text       TEXT NOT NULL,
    speed      REAL NOT NULL,
    pitch      REAL NOT NULL,
    emotion    TEXT NOT NULL,
    audio_ref  TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS payments (
    id             BLOB PRIMARY KEY,
    user_id        BLOB NOT NULL REFERENCES users(id),
    tier           TEXT NOT NULL,
    amount         REAL NOT NULL,
    method         TEXT NOT NULL,
    transaction_id TEXT NOT NULL UNIQUE,
    created_at     TEXT NOT NULL
);
"#;

/// Built-in voice catalogue, seeded on first start.
const PRESET_VOICES: &[(&str, &str, i64)] = &[
    ("Nova (Neutral Male)", "en-us", 0),
    ("Stella (Neutral Female)", "en-us+f3", 0),
    ("Orion (Deep Male)", "en-us", -5),
    ("Lyra (Bright Female)", "en-us+f4", 5),
    ("Echo (Multilingual)", "en", 0),
];

#[derive(Clone)]
pub struct Store {
    pool: SqlitePool,
}

impl Store {
    /// Open (creating if missing) the database file and apply the schema.
    pub async fn open(path: &Path) -> Result<Self, AppError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    async fn init_schema(&self) -> Result<(), AppError> {
        for statement in SCHEMA.split(';').filter(|s| !s.trim().is_empty()) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    /// Insert the preset voices unless some already exist.
    pub async fn seed_builtin_voices(&self) -> Result<(), AppError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM voices WHERE kind = 'builtin'")
                .fetch_one(&self.pool)
                .await?;
        if count > 0 {
            return Ok(());
        }

        for &(name, engine_voice, pitch_shift) in PRESET_VOICES {
            sqlx::query(
                "INSERT INTO voices (id, owner_id, name, kind, engine_voice, pitch_shift, sample_ref, created_at)
                 VALUES (?1, NULL, ?2, 'builtin', ?3, ?4, NULL, ?5)",
            )
            .bind(Uuid::new_v4())
            .bind(name)
            .bind(engine_voice)
            .bind(pitch_shift)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;
        }

        tracing::info!("Seeded {} built-in voices", PRESET_VOICES.len());
        Ok(())
    }

    // --- users ---

    pub async fn insert_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, tier, used_today, usage_date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, 0, ?6, ?7)",
        )
        .bind(id)
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .bind(Tier::Basic)
        .bind(now.date_naive())
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(AppError::DuplicateIdentity(format!(
                    "{} / {}",
                    username, email
                )))
            }
            Err(e) => return Err(e.into()),
        }

        self.user_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database(sqlx::Error::RowNotFound))
    }

    pub async fn user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    pub async fn user_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Count one generation against the user's daily allowance.
    ///
    /// A single conditional UPDATE so concurrent requests cannot push the
    /// counter past the ceiling. The counter rolls over to 1 when the stored
    /// usage date is older than `today`. Returns false when the ceiling has
    /// been reached.
    pub async fn consume_generation(
        &self,
        user_id: Uuid,
        today: NaiveDate,
        ceiling: i64,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE users
             SET used_today = CASE WHEN usage_date = ?1 THEN used_today + 1 ELSE 1 END,
                 usage_date = ?1
             WHERE id = ?2
               AND (usage_date <> ?1 OR used_today < ?3)",
        )
        .bind(today)
        .bind(user_id)
        .bind(ceiling)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Pure tier transition. The daily counter restarts so the new ceiling
    /// applies in full, matching the behaviour of the subscription flow.
    pub async fn set_tier(
        &self,
        user_id: Uuid,
        tier: Tier,
        today: NaiveDate,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET tier = ?1, used_today = 0, usage_date = ?2 WHERE id = ?3")
            .bind(tier)
            .bind(today)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    pub async fn insert_payment(
        &self,
        user_id: Uuid,
        tier: Tier,
        method: &str,
        transaction_id: &str,
    ) -> Result<(), AppError> {
        sqlx::query(
            "INSERT INTO payments (id, user_id, tier, amount, method, transaction_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(tier)
        .bind(tier.price_usd())
        .bind(method)
        .bind(transaction_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    // --- voices ---

    /// Built-in voices plus the caller's own clones.
    pub async fn visible_voices(&self, user_id: Uuid) -> Result<Vec<Voice>, AppError> {
        let voices = sqlx::query_as::<_, Voice>(
            "SELECT * FROM voices WHERE owner_id IS NULL OR owner_id = ?1 ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(voices)
    }

    /// Resolve a voice if it is visible to the given user.
    pub async fn voice_visible_to(
        &self,
        voice_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Voice>, AppError> {
        let voice = sqlx::query_as::<_, Voice>(
            "SELECT * FROM voices WHERE id = ?1 AND (owner_id IS NULL OR owner_id = ?2)",
        )
        .bind(voice_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(voice)
    }

    pub async fn voice_by_id(&self, voice_id: Uuid) -> Result<Option<Voice>, AppError> {
        let voice = sqlx::query_as::<_, Voice>("SELECT * FROM voices WHERE id = ?1")
            .bind(voice_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(voice)
    }

    pub async fn insert_cloned_voice(
        &self,
        owner_id: Uuid,
        name: &str,
        engine_voice: &str,
        sample_ref: &str,
    ) -> Result<Voice, AppError> {
        let id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO voices (id, owner_id, name, kind, engine_voice, pitch_shift, sample_ref, created_at)
             VALUES (?1, ?2, ?3, 'cloned', ?4, 0, ?5, ?6)",
        )
        .bind(id)
        .bind(owner_id)
        .bind(name)
        .bind(engine_voice)
        .bind(sample_ref)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        self.voice_by_id(id)
            .await?
            .ok_or_else(|| AppError::Database(sqlx::Error::RowNotFound))
    }

    pub async fn delete_voice(&self, voice_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM voices WHERE id = ?1")
            .bind(voice_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // --- generations ---

    #[allow(clippy::too_many_arguments)]
    pub async fn insert_generation(
        &self,
        id: Uuid,
        user_id: Uuid,
        voice_id: Uuid,
        text: &str,
        speed: f64,
        pitch: f64,
        emotion: &str,
        audio_ref: &str,
    ) -> Result<Generation, AppError> {
        sqlx::query(
            "INSERT INTO generations (id, user_id, voice_id, text, speed, pitch, emotion, audio_ref, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )
        .bind(id)
        .bind(user_id)
        .bind(voice_id)
        .bind(text)
        .bind(speed)
        .bind(pitch)
        .bind(emotion)
        .bind(audio_ref)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let generation = sqlx::query_as::<_, Generation>("SELECT * FROM generations WHERE id = ?1")
            .bind(id)
            .fetch_one(&self.pool)
            .await?;
        Ok(generation)
    }

    /// The caller's generations, newest first, with voice names joined in.
    pub async fn history(&self, user_id: Uuid) -> Result<Vec<HistoryEntry>, AppError> {
        let entries = sqlx::query_as::<_, HistoryEntry>(
            "SELECT g.id, g.text, v.name AS voice_name, g.speed, g.pitch, g.emotion,
                    g.audio_ref, g.created_at
             FROM generations g
             JOIN voices v ON g.voice_id = v.id
             WHERE g.user_id = ?1
             ORDER BY g.created_at DESC, g.id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(entries)
    }

    pub async fn generation_owned(
        &self,
        generation_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Generation>, AppError> {
        let generation = sqlx::query_as::<_, Generation>(
            "SELECT * FROM generations WHERE id = ?1 AND user_id = ?2",
        )
        .bind(generation_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(generation)
    }

    pub async fn delete_generation(&self, generation_id: Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM generations WHERE id = ?1")
            .bind(generation_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    error
        .as_database_error()
        .is_some_and(|db| db.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> (Store, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(&dir.path().join("test.db")).await.unwrap();
        (store, dir)
    }

    #[tokio::test]
    async fn duplicate_registration_is_rejected() {
        let (store, _dir) = test_store().await;
        store
            .insert_user("nova", "nova@example.com", "hash")
            .await
            .unwrap();

        let err = store
            .insert_user("nova", "other@example.com", "hash")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateIdentity(_)));

        let err = store
            .insert_user("other", "nova@example.com", "hash")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::DuplicateIdentity(_)));
    }

    #[tokio::test]
    async fn quota_counts_up_to_the_ceiling() {
        let (store, _dir) = test_store().await;
        let user = store
            .insert_user("nova", "nova@example.com", "hash")
            .await
            .unwrap();
        let today = Utc::now().date_naive();

        for _ in 0..3 {
            assert!(store.consume_generation(user.id, today, 3).await.unwrap());
        }
        assert!(!store.consume_generation(user.id, today, 3).await.unwrap());

        let user = store.user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.used_today, 3);
    }

    #[tokio::test]
    async fn quota_resets_across_the_daily_boundary() {
        let (store, _dir) = test_store().await;
        let user = store
            .insert_user("nova", "nova@example.com", "hash")
            .await
            .unwrap();

        let day_one = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let day_two = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();

        for _ in 0..2 {
            assert!(store.consume_generation(user.id, day_one, 2).await.unwrap());
        }
        assert!(!store.consume_generation(user.id, day_one, 2).await.unwrap());

        // A new date starts the counter over.
        assert!(store.consume_generation(user.id, day_two, 2).await.unwrap());
        let user = store.user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(user.used_today, 1);
        assert_eq!(user.usage_date, day_two);
    }

    #[tokio::test]
    async fn cloned_voices_are_visible_only_to_their_owner() {
        let (store, _dir) = test_store().await;
        store.seed_builtin_voices().await.unwrap();
        let alice = store
            .insert_user("alice", "alice@example.com", "hash")
            .await
            .unwrap();
        let bob = store
            .insert_user("bob", "bob@example.com", "hash")
            .await
            .unwrap();

        let clone = store
            .insert_cloned_voice(alice.id, "My Voice", "en-us", "sample-1")
            .await
            .unwrap();

        let alice_voices = store.visible_voices(alice.id).await.unwrap();
        assert!(alice_voices.iter().any(|v| v.id == clone.id));

        let bob_voices = store.visible_voices(bob.id).await.unwrap();
        assert!(!bob_voices.iter().any(|v| v.id == clone.id));
        assert_eq!(bob_voices.len(), PRESET_VOICES.len());

        assert!(store
            .voice_visible_to(clone.id, bob.id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn seeding_is_idempotent() {
        let (store, _dir) = test_store().await;
        store.seed_builtin_voices().await.unwrap();
        store.seed_builtin_voices().await.unwrap();

        let user = store
            .insert_user("nova", "nova@example.com", "hash")
            .await
            .unwrap();
        let voices = store.visible_voices(user.id).await.unwrap();
        assert_eq!(voices.len(), PRESET_VOICES.len());
    }
}

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Subscription level. Controls the daily generation ceiling and gates
/// voice cloning.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(rename_all = "PascalCase")]
pub enum Tier {
    Basic,
    Premium,
    Ultimate,
}

impl Tier {
    /// Generations allowed per UTC day.
    pub fn daily_quota(self) -> i64 {
        match self {
            Tier::Basic => 10,
            Tier::Premium => 100,
            Tier::Ultimate => 1000,
        }
    }

    pub fn allows_cloning(self) -> bool {
        !matches!(self, Tier::Basic)
    }

    /// Simulated monthly price, recorded on the payment row.
    pub fn price_usd(self) -> f64 {
        match self {
            Tier::Basic => 0.0,
            Tier::Premium => 9.99,
            Tier::Ultimate => 29.99,
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Tier::Basic => "Basic",
            Tier::Premium => "Premium",
            Tier::Ultimate => "Ultimate",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "basic" => Ok(Tier::Basic),
            "premium" => Ok(Tier::Premium),
            "ultimate" => Ok(Tier::Ultimate),
            other => Err(format!("unknown tier: {}", other)),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub tier: Tier,
    /// Generations consumed on `usage_date`. Counts up towards the tier
    /// ceiling and is reset by the first request on a later date.
    pub used_today: i64,
    pub usage_date: NaiveDate,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Generations still available today.
    pub fn remaining_today(&self, today: NaiveDate) -> i64 {
        let used = if self.usage_date == today {
            self.used_today
        } else {
            0
        };
        (self.tier.daily_quota() - used).max(0)
    }
}

/// The shape of a user returned over the wire. Never carries the hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub tier: Tier,
    pub daily_quota: i64,
    pub remaining_today: i64,
}

impl UserSummary {
    pub fn new(user: &User, today: NaiveDate) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            tier: user.tier,
            daily_quota: user.tier.daily_quota(),
            remaining_today: user.remaining_today(today),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum VoiceKind {
    Builtin,
    Cloned,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Voice {
    pub id: Uuid,
    /// NULL for built-in voices.
    pub owner_id: Option<Uuid>,
    pub name: String,
    pub kind: VoiceKind,
    /// Identifier handed to the synthesis engine, e.g. "en-us".
    pub engine_voice: String,
    /// Simulated pitch offset carried over from the preset catalogue.
    /// Display metadata only, the engine does not apply it.
    pub pitch_shift: i64,
    /// Artifact reference for the uploaded sample of a cloned voice.
    pub sample_ref: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Generation {
    pub id: Uuid,
    pub user_id: Uuid,
    pub voice_id: Uuid,
    pub text: String,
    pub speed: f64,
    /// Accepted and recorded, not applied to the signal.
    pub pitch: f64,
    pub emotion: String,
    /// Artifact reference for the produced WAV.
    pub audio_ref: String,
    pub created_at: DateTime<Utc>,
}

/// History row with the voice name joined in for display.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub text: String,
    pub voice_name: String,
    pub speed: f64,
    pub pitch: f64,
    pub emotion: String,
    pub audio_ref: String,
    pub created_at: DateTime<Utc>,
}

/// Record of one simulated payment.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Payment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub tier: Tier,
    pub amount: f64,
    /// Masked description, e.g. "Simulated Card **** 4242".
    pub method: String,
    pub transaction_id: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn basic_tier_quota_and_gating() {
        assert_eq!(Tier::Basic.daily_quota(), 10);
        assert!(!Tier::Basic.allows_cloning());
        assert!(Tier::Premium.allows_cloning());
        assert!(Tier::Ultimate.allows_cloning());
    }

    #[test]
    fn tier_parses_case_insensitively() {
        assert_eq!("premium".parse::<Tier>().unwrap(), Tier::Premium);
        assert_eq!("ULTIMATE".parse::<Tier>().unwrap(), Tier::Ultimate);
        assert!("gold".parse::<Tier>().is_err());
    }

    #[test]
    fn remaining_resets_on_a_new_day() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 2).unwrap();
        let yesterday = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let user = User {
            id: Uuid::new_v4(),
            username: "nova".into(),
            email: "nova@example.com".into(),
            password_hash: String::new(),
            tier: Tier::Basic,
            used_today: 10,
            usage_date: yesterday,
            created_at: Utc::now(),
        };

        assert_eq!(user.remaining_today(yesterday), 0);
        assert_eq!(user.remaining_today(today), 10);
    }
}

pub mod store;

use rand::Rng;
use serde::Serialize;
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use self::store::{Challenge, ChallengeStore};

/// What the client gets back: an opaque id and the question text.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChallengeDto {
    pub captcha_id: Uuid,
    pub question: String,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum CaptchaError {
    #[error("Captcha not found or expired")]
    NotFound,
    #[error("Captcha expired")]
    Expired,
    #[error("Invalid answer format")]
    InvalidFormat,
    #[error("Incorrect answer")]
    Incorrect,
}

/// Creates an arithmetic challenge and stores the expected answer under a
/// fresh opaque id. Subtraction is ordered so the answer is never negative.
pub async fn generate(store: &dyn ChallengeStore, ttl_secs: i64) -> ChallengeDto {
    let (question, answer) = {
        let mut rng = rand::thread_rng();
        let a: i64 = rng.gen_range(1..=20);
        let b: i64 = rng.gen_range(1..=20);
        if rng.gen_bool(0.5) {
            (format!("What is {} + {}?", a, b), a + b)
        } else {
            let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
            (format!("What is {} - {}?", hi, lo), hi - lo)
        }
    };

    let captcha_id = Uuid::new_v4();
    store
        .insert(
            captcha_id,
            Challenge {
                answer,
                expires_at: OffsetDateTime::now_utc() + Duration::seconds(ttl_secs),
            },
        )
        .await;

    debug!(%captcha_id, "captcha issued");
    ChallengeDto {
        captcha_id,
        question,
    }
}

/// Validates and consumes a challenge. The entry is removed before the
/// answer is inspected, so a challenge can never be retried, not even after
/// a malformed or wrong answer.
pub async fn validate(
    store: &dyn ChallengeStore,
    id: Uuid,
    answer: &str,
) -> Result<(), CaptchaError> {
    let challenge = store.take(id).await.ok_or(CaptchaError::NotFound)?;

    if challenge.expires_at < OffsetDateTime::now_utc() {
        return Err(CaptchaError::Expired);
    }

    let parsed: i64 = answer
        .trim()
        .parse()
        .map_err(|_| CaptchaError::InvalidFormat)?;

    if parsed != challenge.answer {
        return Err(CaptchaError::Incorrect);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::store::MemoryChallengeStore;
    use super::*;

    async fn store_with(id: Uuid, answer: i64, ttl_secs: i64) -> MemoryChallengeStore {
        let store = MemoryChallengeStore::new();
        let challenge = Challenge {
            answer,
            expires_at: OffsetDateTime::now_utc() + Duration::seconds(ttl_secs),
        };
        store.insert(id, challenge).await;
        store
    }

    #[tokio::test]
    async fn generated_question_has_expected_shape() {
        let store = MemoryChallengeStore::new();
        for _ in 0..50 {
            let dto = generate(&store, 300).await;
            assert!(dto.question.starts_with("What is "));
            assert!(dto.question.ends_with('?'));
            assert!(dto.question.contains('+') || dto.question.contains('-'));
        }
    }

    #[tokio::test]
    async fn generated_challenge_validates_with_its_own_answer() {
        let store = MemoryChallengeStore::new();
        let dto = generate(&store, 300).await;

        // Solve the question the way a human would.
        let parts: Vec<&str> = dto
            .question
            .trim_start_matches("What is ")
            .trim_end_matches('?')
            .split_whitespace()
            .collect();
        let a: i64 = parts[0].parse().expect("operand");
        let b: i64 = parts[2].parse().expect("operand");
        let answer = if parts[1] == "+" { a + b } else { a - b };
        assert!(answer >= 0);

        assert_eq!(validate(&store, dto.captcha_id, &answer.to_string()).await, Ok(()));
    }

    #[tokio::test]
    async fn challenge_validates_at_most_once() {
        let id = Uuid::new_v4();
        let store = store_with(id, 12, 300).await;

        assert_eq!(validate(&store, id, "12").await, Ok(()));
        // Same correct answer again: the entry is gone.
        assert_eq!(validate(&store, id, "12").await, Err(CaptchaError::NotFound));
    }

    #[tokio::test]
    async fn wrong_answer_burns_the_challenge() {
        let id = Uuid::new_v4();
        let store = store_with(id, 12, 300).await;

        assert_eq!(validate(&store, id, "13").await, Err(CaptchaError::Incorrect));
        assert_eq!(validate(&store, id, "12").await, Err(CaptchaError::NotFound));
    }

    #[tokio::test]
    async fn malformed_answer_burns_the_challenge() {
        let id = Uuid::new_v4();
        let store = store_with(id, 12, 300).await;

        assert_eq!(
            validate(&store, id, "twelve").await,
            Err(CaptchaError::InvalidFormat)
        );
        assert_eq!(validate(&store, id, "12").await, Err(CaptchaError::NotFound));
    }

    #[tokio::test]
    async fn expired_challenge_fails_and_is_removed() {
        let id = Uuid::new_v4();
        let store = store_with(id, 12, -1).await;

        assert_eq!(validate(&store, id, "12").await, Err(CaptchaError::Expired));
        assert_eq!(validate(&store, id, "12").await, Err(CaptchaError::NotFound));
    }

    #[tokio::test]
    async fn answer_with_surrounding_whitespace_is_accepted() {
        let id = Uuid::new_v4();
        let store = store_with(id, 7, 300).await;
        assert_eq!(validate(&store, id, " 7 ").await, Ok(()));
    }
}

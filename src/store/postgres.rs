//! Postgres-backed [`QuizStore`] (the reference backend). Every
//! mutating operation runs inside a single `SERIALIZABLE` transaction so
//! the join-capacity race and the answer-claim race are correct even if
//! two gateway processes somehow raced on the same room — the
//! in-process per-room actor is the fast path, this is the backstop.

use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};

use super::{ClaimError, JoinError, ParticipantRow, QuizStore, RoomRow, StoreError, UserRow};
use crate::protocol::{Question, QuestionIndex, UserId};

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        Ok(Self { pool })
    }

    async fn begin_serializable(
        &self,
    ) -> Result<sqlx::Transaction<'_, sqlx::Postgres>, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL SERIALIZABLE")
            .execute(&mut *tx)
            .await
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        Ok(tx)
    }
}

#[async_trait]
impl QuizStore for PgStore {
    async fn get_room(&self, room_id: &str) -> Result<Option<RoomRow>, StoreError> {
        let row = sqlx::query(
            r#"SELECT id, "hostId", "isActive", "maxPlayers" FROM "Room" WHERE id = $1"#,
        )
        .bind(room_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StoreError::Backend(err.to_string()))?;

        Ok(row.map(|row| RoomRow {
            room_id: row.get("id"),
            host_user_id: row.get("hostId"),
            max_players: row.get::<i32, _>("maxPlayers") as u8,
            is_active: row.get("isActive"),
        }))
    }

    async fn get_user(&self, user_id: UserId) -> Result<Option<UserRow>, StoreError> {
        let row = sqlx::query(r#"SELECT id, name, "isAdmin" FROM "User" WHERE id = $1"#)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StoreError::Backend(err.to_string()))?;

        Ok(row.map(|row| UserRow {
            user_id: row.get("id"),
            name: row.get("name"),
            is_admin: row.get("isAdmin"),
        }))
    }

    async fn join_participant(
        &self,
        user_id: UserId,
        room_id: &str,
    ) -> Result<ParticipantRow, JoinError> {
        let mut tx = self
            .begin_serializable()
            .await
            .map_err(|_| JoinError::NotFound)?;

        let room_row = sqlx::query(
            r#"SELECT "isActive", "maxPlayers" FROM "Room" WHERE id = $1 FOR UPDATE"#,
        )
        .bind(room_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|_| JoinError::NotFound)?
        .ok_or(JoinError::NotFound)?;

        if !room_row.get::<bool, _>("isActive") {
            return Err(JoinError::Inactive);
        }
        let max_players: i32 = room_row.get("maxPlayers");

        if let Some(existing) = sqlx::query(
            r#"SELECT "userId", score FROM "RoomParticipant" WHERE "roomId" = $1 AND "userId" = $2"#,
        )
        .bind(room_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|_| JoinError::NotFound)?
        {
            let user_name = sqlx::query(r#"SELECT name FROM "User" WHERE id = $1"#)
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(|_| JoinError::NotFound)?
                .get("name");
            tx.commit().await.map_err(|_| JoinError::NotFound)?;
            return Ok(ParticipantRow {
                user_id: existing.get("userId"),
                user_name,
                score: existing.get("score"),
            });
        }

        if let Some(other_room) =
            sqlx::query(r#"SELECT "roomId" FROM "RoomParticipant" WHERE "userId" = $1"#)
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(|_| JoinError::NotFound)?
        {
            let other_room_id: String = other_room.get("roomId");
            if other_room_id != room_id {
                return Err(JoinError::AlreadyInOtherRoom);
            }
        }

        let count_row = sqlx::query(r#"SELECT COUNT(*) AS n FROM "RoomParticipant" WHERE "roomId" = $1"#)
            .bind(room_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|_| JoinError::NotFound)?;
        let current_count: i64 = count_row.get("n");
        if current_count >= max_players as i64 {
            return Err(JoinError::Full);
        }

        let user_row = sqlx::query(r#"SELECT name FROM "User" WHERE id = $1"#)
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await
            .map_err(|_| JoinError::NotFound)?;
        let user_name: String = user_row.get("name");

        sqlx::query(
            r#"INSERT INTO "RoomParticipant" ("roomId", "userId", score, "joinedAt")
               VALUES ($1, $2, 0, now())
               ON CONFLICT ("roomId", "userId") DO NOTHING"#,
        )
        .bind(room_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|_| JoinError::NotFound)?;

        tx.commit().await.map_err(|_| JoinError::NotFound)?;

        Ok(ParticipantRow {
            user_id,
            user_name,
            score: 0,
        })
    }

    async fn leave_participant(&self, user_id: UserId, room_id: &str) -> Result<(), StoreError> {
        sqlx::query(r#"DELETE FROM "RoomParticipant" WHERE "roomId" = $1 AND "userId" = $2"#)
            .bind(room_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        Ok(())
    }

    async fn list_participants(&self, room_id: &str) -> Result<Vec<ParticipantRow>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT p."userId", u.name, p.score
               FROM "RoomParticipant" p JOIN "User" u ON u.id = p."userId"
               WHERE p."roomId" = $1"#,
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| StoreError::Backend(err.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| ParticipantRow {
                user_id: row.get("userId"),
                user_name: row.get("name"),
                score: row.get("score"),
            })
            .collect())
    }

    async fn fetch_questions(&self, limit: usize) -> Result<Vec<Question>, StoreError> {
        let rows = sqlx::query(
            r#"SELECT id, text, options, "correctIdx" FROM "Question" ORDER BY random() LIMIT $1"#,
        )
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|err| StoreError::Backend(err.to_string()))?;

        rows.into_iter()
            .map(|row| {
                let options: Vec<String> = row.get("options");
                let options: [String; 4] = options
                    .try_into()
                    .map_err(|_| StoreError::Backend("Question.options must have 4 entries".into()))?;
                Ok(Question {
                    id: row.get("id"),
                    text: row.get("text"),
                    options,
                    correct_idx: row.get::<i32, _>("correctIdx") as u8,
                })
            })
            .collect()
    }

    async fn insert_claim(
        &self,
        room_id: &str,
        question_index: QuestionIndex,
        user_id: UserId,
        tx_hash: &str,
    ) -> Result<(), ClaimError> {
        let mut tx = self
            .begin_serializable()
            .await
            .map_err(ClaimError::Store)?;

        let insert = sqlx::query(
            r#"INSERT INTO "AnswerClaim" ("roomId", "questionIndex", "userId", "txHash", "createdAt")
               VALUES ($1, $2, $3, $4, now())"#,
        )
        .bind(room_id)
        .bind(question_index as i32)
        .bind(user_id)
        .bind(tx_hash)
        .execute(&mut *tx)
        .await;

        if let Err(err) = insert {
            if is_unique_violation(&err) {
                return Err(ClaimError::Duplicate);
            }
            return Err(ClaimError::Store(StoreError::Backend(err.to_string())));
        }

        sqlx::query(r#"UPDATE "RoomParticipant" SET score = score + 1 WHERE "roomId" = $1 AND "userId" = $2"#)
            .bind(room_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(|err| ClaimError::Store(StoreError::Backend(err.to_string())))?;

        tx.commit()
            .await
            .map_err(|err| ClaimError::Store(StoreError::Backend(err.to_string())))?;

        Ok(())
    }

    async fn get_rating(&self, user_id: UserId) -> Result<i64, StoreError> {
        let row = sqlx::query(r#"SELECT rating FROM "PlayerRating" WHERE "userId" = $1"#)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|err| StoreError::Backend(err.to_string()))?;
        Ok(row.map(|row| row.get("rating")).unwrap_or(1200))
    }

    async fn upsert_rating(&self, user_id: UserId, rating: i64) -> Result<(), StoreError> {
        sqlx::query(
            r#"INSERT INTO "PlayerRating" ("userId", rating, "updatedAt") VALUES ($1, $2, now())
               ON CONFLICT ("userId") DO UPDATE SET rating = EXCLUDED.rating, "updatedAt" = now()"#,
        )
        .bind(user_id)
        .bind(rating)
        .execute(&self.pool)
        .await
        .map_err(|err| StoreError::Backend(err.to_string()))?;
        Ok(())
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505"))
}

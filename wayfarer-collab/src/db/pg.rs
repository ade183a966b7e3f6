use async_trait::async_trait;
use log::info;
use sqlx::{
    error::BoxDynError,
    postgres::{PgPoolOptions, PgRow},
    query,
    types::Json,
    Error as SqlxError, PgPool, Row,
};
use wayfarer_core::{
    catalog::default_catalog, currency_for_origin, Answer, AnswerValue, Category, Group, GroupId,
    Leg, MemberId, NewGroup, NewSuggestion, Question, QuestionKind, Room, RoomId, RoomStatus,
    Suggestion, SuggestionDetails, SuggestionId, Vote, VoteDirection,
};

use crate::{Database, DatabaseError, IntoDatabaseError, Result};

/// A postgres database implementation for wayfarer
pub struct PgDatabase {
    pool: PgPool,
}

const ROOM_SELECT: &str = "
    SELECT
        rooms.*,
        COALESCE(
            ARRAY_AGG(room_completions.member_id) FILTER (WHERE room_completions.member_id IS NOT NULL),
            '{}'
        ) AS completed_by
    FROM rooms
        LEFT JOIN room_completions ON room_completions.room_id = rooms.id";

impl PgDatabase {
    pub async fn new(url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(url)
            .await
            .map_err(|e| DatabaseError::Internal(Box::new(e)))?;

        Ok(Self { pool })
    }

    /// Brings the schema up to date
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| DatabaseError::Internal(Box::new(e)))?;

        info!("Database schema is up to date");
        Ok(())
    }
}

fn decode_error<E>(error: E) -> SqlxError
where
    E: Into<BoxDynError>,
{
    SqlxError::Decode(error.into())
}

fn group_from_row(row: &PgRow) -> std::result::Result<Group, SqlxError> {
    let group_size: i32 = row.try_get("group_size")?;

    Ok(Group {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        origin: row.try_get("origin")?,
        destination: row.try_get("destination")?,
        start_date: row.try_get("start_date")?,
        end_date: row.try_get("end_date")?,
        group_size: u32::try_from(group_size).map_err(decode_error)?,
    })
}

fn room_from_row(row: &PgRow) -> std::result::Result<Room, SqlxError> {
    let category: String = row.try_get("category")?;
    let status: String = row.try_get("status")?;
    let completed_by: Vec<MemberId> = row.try_get("completed_by")?;

    Ok(Room {
        id: row.try_get("id")?,
        group_id: row.try_get("group_id")?,
        category: category.parse::<Category>().map_err(decode_error)?,
        status: status.parse::<RoomStatus>().map_err(decode_error)?,
        completed_by: completed_by.into_iter().collect(),
        selected: row.try_get("selected")?,
    })
}

fn question_from_row(row: &PgRow) -> std::result::Result<Question, SqlxError> {
    let schema_version: i32 = row.try_get("schema_version")?;
    let kind: Json<QuestionKind> = row.try_get("kind")?;

    Ok(Question {
        id: row.try_get("id")?,
        room_id: row.try_get("room_id")?,
        schema_version: u32::try_from(schema_version).unwrap_or_default(),
        text: row.try_get("text")?,
        order: row.try_get("sort_order")?,
        kind: kind.0,
    })
}

fn answer_from_row(row: &PgRow) -> std::result::Result<Answer, SqlxError> {
    let value: Json<AnswerValue> = row.try_get("value")?;

    Ok(Answer {
        question_id: row.try_get("question_id")?,
        member_id: row.try_get("member_id")?,
        value: value.0,
    })
}

fn suggestion_from_row(row: &PgRow) -> std::result::Result<Suggestion, SqlxError> {
    let details: Json<SuggestionDetails> = row.try_get("details")?;
    let leg: Option<String> = row.try_get("leg")?;

    Ok(Suggestion {
        id: row.try_get("id")?,
        room_id: row.try_get("room_id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        details: details.0,
        leg: leg
            .map(|l| l.parse::<Leg>())
            .transpose()
            .map_err(decode_error)?,
    })
}

fn vote_from_row(row: &PgRow) -> std::result::Result<Vote, SqlxError> {
    let direction: String = row.try_get("direction")?;

    Ok(Vote {
        suggestion_id: row.try_get("suggestion_id")?,
        member_id: row.try_get("member_id")?,
        direction: direction.parse::<VoteDirection>().map_err(decode_error)?,
    })
}

#[async_trait]
impl Database for PgDatabase {
    async fn create_group(&self, new_group: NewGroup) -> Result<Group> {
        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;

        let row = query(
            "INSERT INTO groups (name, origin, destination, start_date, end_date, group_size)
            VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(&new_group.name)
        .bind(&new_group.origin)
        .bind(&new_group.destination)
        .bind(new_group.start_date)
        .bind(new_group.end_date)
        .bind(new_group.group_size as i32)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| e.any())?;

        let group = group_from_row(&row).map_err(|e| e.any())?;

        for category in Category::ALL {
            query("INSERT INTO rooms (group_id, category) VALUES ($1, $2)")
                .bind(group.id)
                .bind(category.as_str())
                .execute(&mut *tx)
                .await
                .map_err(|e| e.any())?;
        }

        tx.commit().await.map_err(|e| e.any())?;
        Ok(group)
    }

    async fn group_by_id(&self, group_id: GroupId) -> Result<Group> {
        query("SELECT * FROM groups WHERE id = $1")
            .bind(group_id)
            .fetch_one(&self.pool)
            .await
            .and_then(|row| group_from_row(&row))
            .map_err(|e| e.not_found_or("group", "id"))
    }

    async fn update_group(&self, group: &Group) -> Result<Group> {
        query(
            "UPDATE groups
            SET name = $1, destination = $2, start_date = $3, end_date = $4, group_size = $5
            WHERE id = $6 RETURNING *",
        )
        .bind(&group.name)
        .bind(&group.destination)
        .bind(group.start_date)
        .bind(group.end_date)
        .bind(group.group_size as i32)
        .bind(group.id)
        .fetch_one(&self.pool)
        .await
        .and_then(|row| group_from_row(&row))
        .map_err(|e| e.not_found_or("group", "id"))
    }

    async fn room_by_id(&self, room_id: RoomId) -> Result<Room> {
        let sql = format!("{ROOM_SELECT} WHERE rooms.id = $1 GROUP BY rooms.id");

        query(&sql)
            .bind(room_id)
            .fetch_one(&self.pool)
            .await
            .and_then(|row| room_from_row(&row))
            .map_err(|e| e.not_found_or("room", "id"))
    }

    async fn rooms_by_group(&self, group_id: GroupId) -> Result<Vec<Room>> {
        // Ensure group exists
        let _ = self.group_by_id(group_id).await?;

        let sql = format!(
            "{ROOM_SELECT} WHERE rooms.group_id = $1 GROUP BY rooms.id ORDER BY rooms.id"
        );

        let rows = query(&sql)
            .bind(group_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        rows.iter()
            .map(room_from_row)
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| e.any())
    }

    async fn update_room_status(&self, room_id: RoomId, status: RoomStatus) -> Result<()> {
        let result = query("UPDATE rooms SET status = $1 WHERE id = $2")
            .bind(status.as_str())
            .bind(room_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        ensure_affected(result.rows_affected(), "room")
    }

    async fn lock_room(&self, room_id: RoomId, suggestion_ids: &[SuggestionId]) -> Result<()> {
        let result = query("UPDATE rooms SET status = $1, selected = $2 WHERE id = $3")
            .bind(RoomStatus::Locked.as_str())
            .bind(suggestion_ids)
            .bind(room_id)
            .execute(&self.pool)
            .await
            .map_err(|e| e.any())?;

        ensure_affected(result.rows_affected(), "room")
    }

    async fn mark_complete(&self, room_id: RoomId, member_id: MemberId) -> Result<Room> {
        // Ensure room exists
        let _ = self.room_by_id(room_id).await?;

        query(
            "INSERT INTO room_completions (room_id, member_id) VALUES ($1, $2)
            ON CONFLICT DO NOTHING",
        )
        .bind(room_id)
        .bind(member_id)
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())?;

        self.room_by_id(room_id).await
    }

    async fn clear_room_voting_data(&self, room_id: RoomId) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;

        // Votes go with their suggestions
        query("DELETE FROM suggestions WHERE room_id = $1")
            .bind(room_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| e.any())?;

        let result = query("UPDATE rooms SET selected = '{}' WHERE id = $1")
            .bind(room_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| e.any())?;

        ensure_affected(result.rows_affected(), "room")?;
        tx.commit().await.map_err(|e| e.any())
    }

    async fn questions(&self, room_id: RoomId) -> Result<Vec<Question>> {
        let rows = query("SELECT * FROM questions WHERE room_id = $1")
            .bind(room_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        rows.iter()
            .map(question_from_row)
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| e.any())
    }

    async fn regenerate_questions(&self, room_id: RoomId) -> Result<()> {
        let room = self.room_by_id(room_id).await?;
        let group = self.group_by_id(room.group_id).await?;

        let currency = currency_for_origin(&group.origin);
        let catalog = default_catalog(room_id, room.category, currency);

        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;

        query("DELETE FROM questions WHERE room_id = $1")
            .bind(room_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| e.any())?;

        for question in catalog {
            query(
                "INSERT INTO questions (room_id, schema_version, text, sort_order, kind)
                VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(room_id)
            .bind(question.schema_version as i32)
            .bind(&question.text)
            .bind(question.order)
            .bind(Json(&question.kind))
            .execute(&mut *tx)
            .await
            .map_err(|e| e.any())?;
        }

        tx.commit().await.map_err(|e| e.any())
    }

    async fn answers(&self, room_id: RoomId, member_id: Option<MemberId>) -> Result<Vec<Answer>> {
        let rows = query(
            "SELECT * FROM answers
            WHERE room_id = $1 AND ($2::INTEGER IS NULL OR member_id = $2)
            ORDER BY question_id, member_id",
        )
        .bind(room_id)
        .bind(member_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        rows.iter()
            .map(answer_from_row)
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| e.any())
    }

    async fn submit_answer(&self, room_id: RoomId, answer: &Answer) -> Result<()> {
        let member_id = answer.member_id.ok_or(DatabaseError::NotFound {
            resource: "member",
            identifier: "id",
        })?;

        // Ensure question belongs to the room
        query("SELECT id FROM questions WHERE id = $1 AND room_id = $2")
            .bind(answer.question_id)
            .bind(room_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("question", "id"))?;

        query(
            "INSERT INTO answers (question_id, room_id, member_id, value) VALUES ($1, $2, $3, $4)
            ON CONFLICT (question_id, member_id) DO UPDATE SET value = EXCLUDED.value",
        )
        .bind(answer.question_id)
        .bind(room_id)
        .bind(member_id)
        .bind(Json(&answer.value))
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())
        .map(|_| ())
    }

    async fn suggestions(&self, room_id: RoomId) -> Result<Vec<Suggestion>> {
        let rows = query("SELECT * FROM suggestions WHERE room_id = $1 ORDER BY id")
            .bind(room_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        rows.iter()
            .map(suggestion_from_row)
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| e.any())
    }

    async fn store_suggestions(
        &self,
        room_id: RoomId,
        suggestions: Vec<NewSuggestion>,
    ) -> Result<Vec<Suggestion>> {
        // Ensure room exists
        let _ = self.room_by_id(room_id).await?;

        let mut tx = self.pool.begin().await.map_err(|e| e.any())?;
        let mut stored = Vec::with_capacity(suggestions.len());

        for suggestion in suggestions {
            let row = query(
                "INSERT INTO suggestions (room_id, name, description, details, leg)
                VALUES ($1, $2, $3, $4, $5) RETURNING *",
            )
            .bind(room_id)
            .bind(&suggestion.name)
            .bind(&suggestion.description)
            .bind(Json(&suggestion.details))
            .bind(suggestion.leg.map(|l| l.as_str()))
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| e.any())?;

            stored.push(suggestion_from_row(&row).map_err(|e| e.any())?);
        }

        tx.commit().await.map_err(|e| e.any())?;
        Ok(stored)
    }

    async fn submit_vote(&self, vote: &Vote) -> Result<()> {
        // Ensure suggestion exists
        query("SELECT id FROM suggestions WHERE id = $1")
            .bind(vote.suggestion_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| e.not_found_or("suggestion", "id"))?;

        query(
            "INSERT INTO votes (suggestion_id, member_id, direction) VALUES ($1, $2, $3)
            ON CONFLICT (suggestion_id, member_id) DO UPDATE SET direction = EXCLUDED.direction",
        )
        .bind(vote.suggestion_id)
        .bind(vote.member_id)
        .bind(vote.direction.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| e.any())
        .map(|_| ())
    }

    async fn votes(&self, suggestion_id: SuggestionId) -> Result<Vec<Vote>> {
        let rows = query("SELECT * FROM votes WHERE suggestion_id = $1")
            .bind(suggestion_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| e.any())?;

        rows.iter()
            .map(vote_from_row)
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| e.any())
    }

    async fn room_votes(&self, room_id: RoomId) -> Result<Vec<Vote>> {
        let rows = query(
            "SELECT votes.* FROM votes
                INNER JOIN suggestions ON votes.suggestion_id = suggestions.id
            WHERE suggestions.room_id = $1",
        )
        .bind(room_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| e.any())?;

        rows.iter()
            .map(vote_from_row)
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| e.any())
    }
}

fn ensure_affected(rows_affected: u64, resource: &'static str) -> Result<()> {
    if rows_affected == 0 {
        return Err(DatabaseError::NotFound {
            resource,
            identifier: "id",
        });
    }

    Ok(())
}

impl IntoDatabaseError for SqlxError {
    fn any(self) -> DatabaseError {
        DatabaseError::Internal(Box::new(self))
    }

    fn not_found_or(self, resource: &'static str, identifier: &'static str) -> DatabaseError {
        match self {
            SqlxError::RowNotFound => DatabaseError::NotFound {
                resource,
                identifier,
            },
            e => Self::any(e),
        }
    }
}

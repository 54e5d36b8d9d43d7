use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::traits::RequestRepository;
use crate::domain::{CashRequest, RequestKind, RequestStatus, RetireReason};
use crate::error::{AppError, AppResult};

const REQUEST_COLUMNS: &str = "id, kind, amount, requester_id, requester_name, latitude, \
     longitude, address, status, matched_with, created_at, updated_at";

pub struct PgRequestRepository {
    pool: PgPool,
}

impl PgRequestRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RequestRepository for PgRequestRepository {
    async fn insert(&self, request: &CashRequest) -> AppResult<CashRequest> {
        let created = sqlx::query_as::<_, CashRequest>(&format!(
            r#"
            INSERT INTO cash_requests
                (id, kind, amount, requester_id, requester_name, latitude, longitude,
                 address, status, matched_with, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(request.id)
        .bind(request.kind)
        .bind(request.amount)
        .bind(&request.requester_id)
        .bind(&request.requester_name)
        .bind(request.location.lat)
        .bind(request.location.lng)
        .bind(&request.location.address)
        .bind(request.status)
        .bind(request.matched_with)
        .bind(request.created_at)
        .bind(request.updated_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<CashRequest>> {
        let request = sqlx::query_as::<_, CashRequest>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM cash_requests WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(request)
    }

    async fn list_pending(&self, kind: Option<RequestKind>) -> AppResult<Vec<CashRequest>> {
        let requests = sqlx::query_as::<_, CashRequest>(&format!(
            r#"
            SELECT {REQUEST_COLUMNS}
            FROM cash_requests
            WHERE status = 'pending'
              AND ($1::request_kind IS NULL OR kind = $1)
            ORDER BY seq ASC
            "#
        ))
        .bind(kind)
        .fetch_all(&self.pool)
        .await?;
        Ok(requests)
    }

    async fn retire(&self, id: Uuid, reason: RetireReason) -> AppResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE cash_requests
            SET status = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'pending'
            "#,
        )
        .bind(id)
        .bind(reason.target_status())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn retire_pair(&self, first: Uuid, second: Uuid) -> AppResult<(CashRequest, CashRequest)> {
        if first == second {
            return Err(AppError::BadRequest(
                "a request cannot be matched with itself".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;

        // Row locks are taken in id order so two claimers cannot deadlock.
        let locked: Vec<(Uuid, RequestStatus)> = sqlx::query_as(
            r#"
            SELECT id, status
            FROM cash_requests
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            "#,
        )
        .bind(vec![first, second])
        .fetch_all(&mut *tx)
        .await?;

        let both_pending = locked.len() == 2
            && locked
                .iter()
                .all(|(_, status)| *status == RequestStatus::Pending);
        if !both_pending {
            tx.rollback().await?;
            return Err(AppError::Conflict(
                "one of the requests is no longer pending".to_string(),
            ));
        }

        let updated = sqlx::query_as::<_, CashRequest>(&format!(
            r#"
            UPDATE cash_requests
            SET status = 'matched',
                matched_with = CASE WHEN id = $1 THEN $2 ELSE $1 END,
                updated_at = NOW()
            WHERE id IN ($1, $2) AND status = 'pending'
            RETURNING {REQUEST_COLUMNS}
            "#
        ))
        .bind(first)
        .bind(second)
        .fetch_all(&mut *tx)
        .await?;

        if updated.len() != 2 {
            tx.rollback().await?;
            return Err(AppError::Conflict(
                "one of the requests is no longer pending".to_string(),
            ));
        }

        tx.commit().await?;

        let mut updated = updated.into_iter();
        match (updated.next(), updated.next()) {
            (Some(a), Some(b)) if a.id == first => Ok((a, b)),
            (Some(a), Some(b)) => Ok((b, a)),
            _ => Err(AppError::InternalError(anyhow::anyhow!(
                "matched pair update returned fewer rows than committed"
            ))),
        }
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(())
    }
}

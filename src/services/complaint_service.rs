// src/services/complaint_service.rs
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing;

use crate::{
    errors::{require_fields, FreightError as AppError},
    models::{
        complaint::{Complaint, ComplaintRequest, ComplaintStatus},
        user::{User, UserRole},
    },
    services::store_service::{EntityStore, StoreKeys, UnitOfWork},
    utils::id_generator::IdType,
};

#[async_trait]
pub trait ComplaintOperations: Send + Sync {
    async fn file_complaint(&self, request: ComplaintRequest) -> Result<Complaint, AppError>;
    async fn list_complaints(&self) -> Result<Vec<Complaint>, AppError>;
    async fn resolve_complaint(&self, ticket_id: &str) -> Result<Complaint, AppError>;
}

pub struct ComplaintService {
    store: Arc<EntityStore>,
}

impl ComplaintService {
    pub fn new(store: Arc<EntityStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl ComplaintOperations for ComplaintService {
    async fn file_complaint(&self, request: ComplaintRequest) -> Result<Complaint, AppError> {
        tracing::info!("Filing complaint from {} ({})", request.reported_by, request.role);

        require_fields(&[
            ("reported_by", &request.reported_by),
            ("subject", &request.subject),
            ("description", &request.description),
        ])?;
        if request.role == UserRole::Admin {
            return Err(AppError::validation_error("role", "complaints are filed by senders or drivers"));
        }

        let reporter = self
            .store
            .get::<User>(&request.reported_by)
            .await?
            .ok_or_else(|| AppError::user_not_found(&request.reported_by))?;
        if reporter.role != request.role {
            return Err(AppError::validation_error("role", "does not match the reporting user"));
        }

        let now = Utc::now();
        let template = Complaint {
            id: String::new(),
            ticket_id: String::new(),
            reported_by: reporter.id,
            role: request.role,
            subject: request.subject.trim().to_string(),
            description: request.description.trim().to_string(),
            priority: request.priority,
            status: ComplaintStatus::Open,
            created_at: now,
            resolved_at: None,
            updated_at: now,
        };

        let complaint = self.store.insert_generated(template, IdType::Complaint).await?;

        tracing::info!("Complaint filed: {}", complaint.ticket_id);
        Ok(complaint)
    }

    async fn list_complaints(&self) -> Result<Vec<Complaint>, AppError> {
        let mut complaints: Vec<Complaint> = self.store.list().await?;
        complaints.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(complaints)
    }

    async fn resolve_complaint(&self, ticket_id: &str) -> Result<Complaint, AppError> {
        tracing::info!("Resolving complaint: {}", ticket_id);

        let before = self
            .store
            .load_by_key::<Complaint>(&StoreKeys::complaint_ticket(ticket_id))
            .await?
            .ok_or_else(|| AppError::not_found(format!("Ticket {}", ticket_id)))?;

        if before.record.status == ComplaintStatus::Resolved {
            tracing::warn!("Ticket {} is already resolved", ticket_id);
            return Err(AppError::conflict(format!("Ticket {} is already resolved", ticket_id)));
        }

        let now = Utc::now();
        let mut complaint = before.record.clone();
        complaint.status = ComplaintStatus::Resolved;
        complaint.resolved_at = Some(now);
        complaint.updated_at = now;

        let mut unit = UnitOfWork::new();
        unit.update(&before, &complaint)?;
        self.store.commit(unit).await?;

        Ok(complaint)
    }
}

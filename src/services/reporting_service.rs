//! Servicio de reporting
//!
//! Agregación de solo lectura para el dashboard del admin: conteos por
//! ruta y por estado, y desglose mensual de aprobaciones. No tiene
//! invariantes propios; consume lo que el servicio de capacidad dejó
//! commiteado.

use crate::models::{Mountain, Registration, RegistrationStatus};
use crate::store::{DocumentStore, MOUNTAINS, REGISTRATIONS};
use crate::utils::errors::AppError;
use chrono::{Datelike, Utc};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Conteos de una ruta para el dashboard
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteReport {
    pub route_id: Option<String>,
    pub name: String,
    pub max_capacity: u32,
    pub used_capacity: u32,
    pub remaining_capacity: u32,
    pub pending: u32,
    pub approved: u32,
    pub rejected: u32,
    pub cancelled: u32,
}

/// Aprobaciones por mes calendario (`createdAt` de la inscripción)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyCount {
    pub month: String,
    pub approved: u32,
}

/// Reporte completo de una montaña
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MountainReport {
    pub mountain_id: String,
    pub mountain_name: String,
    pub generated_at: String,
    pub routes: Vec<RouteReport>,
    pub monthly_approved: Vec<MonthlyCount>,
}

pub struct ReportingService {
    store: Arc<dyn DocumentStore>,
}

impl ReportingService {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn mountain_report(&self, mountain_id: &str) -> Result<MountainReport, AppError> {
        let mountain_doc = self
            .store
            .get(MOUNTAINS, mountain_id)
            .await?
            .ok_or_else(|| AppError::MountainNotFound(mountain_id.to_string()))?;
        let mountain: Mountain = mountain_doc.decode()?;

        let docs = self
            .store
            .query_eq(REGISTRATIONS, "mountainId", mountain_id)
            .await?;

        let mut routes: Vec<RouteReport> = mountain
            .routes
            .iter()
            .map(|r| RouteReport {
                route_id: r.route_id.clone(),
                name: r.name.clone(),
                max_capacity: r.max_capacity,
                used_capacity: r.used_capacity,
                remaining_capacity: r.remaining_capacity(),
                pending: 0,
                approved: 0,
                rejected: 0,
                cancelled: 0,
            })
            .collect();

        let mut monthly: BTreeMap<String, u32> = BTreeMap::new();
        for doc in &docs {
            let registration: Registration = match doc.decode() {
                Ok(r) => r,
                Err(e) => {
                    // Reporte de solo lectura: un documento corrupto se
                    // omite en lugar de tirar todo el dashboard
                    log::warn!("⚠️ Se omite documento corrupto en el reporte: {}", e);
                    continue;
                }
            };

            if let Some(idx) = mountain.find_route(
                registration.route_id.as_deref(),
                Some(&registration.route_name),
            ) {
                let report = &mut routes[idx];
                match registration.status {
                    RegistrationStatus::Pending => report.pending += 1,
                    RegistrationStatus::Approved => report.approved += 1,
                    RegistrationStatus::Rejected => report.rejected += 1,
                    RegistrationStatus::Cancelled => report.cancelled += 1,
                }
            }

            if registration.status == RegistrationStatus::Approved {
                let month = format!(
                    "{:04}-{:02}",
                    registration.created_at.year(),
                    registration.created_at.month()
                );
                *monthly.entry(month).or_insert(0) += 1;
            }
        }

        Ok(MountainReport {
            mountain_id: mountain_id.to_string(),
            mountain_name: mountain.name,
            generated_at: Utc::now().to_rfc3339(),
            routes,
            monthly_approved: monthly
                .into_iter()
                .map(|(month, approved)| MonthlyCount { month, approved })
                .collect(),
        })
    }
}

//! Servicio de capacidad
//!
//! Orquesta los ciclos transaccionales leer-validar-escribir contra el
//! document store. Cada operación pública es una transacción lógica: se
//! leen los documentos capturando sus versiones, se computa en memoria con
//! el ledger y la máquina de estados, y se commitea con precondiciones de
//! versión. Un conflicto significa que otro cliente commiteó primero y el
//! intento se repite completo desde la lectura, con backoff acotado.
//!
//! El contador `usedCapacity` de cada ruta se muta únicamente acá, nunca
//! fuera de un commit condicional.

use crate::models::{
    CapacityEffect, InvalidTransition, Mountain, Registration, RegistrationEvent,
    RegistrationStatus, Route, RouteAvailability, RouteStatus,
};
use crate::store::{DocumentStore, Mutation, StoreError, MOUNTAINS, REGISTRATIONS};
use crate::utils::backoff::RetryConfig;
use crate::utils::errors::AppError;
use std::future::Future;
use std::sync::Arc;
use uuid::Uuid;

/// Datos de entrada para crear una inscripción.
/// Al menos una de las dos referencias de ruta debe venir; `route_id`
/// es autoritativo cuando está presente.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub user_id: String,
    pub mountain_id: String,
    pub route_id: Option<String>,
    pub route_name: Option<String>,
}

/// Resultado de un intento de transacción, clasificado para el loop de
/// reintentos: los conflictos y las fallas de transporte se reintentan,
/// los resultados lógicos salen de inmediato.
enum TxnError {
    Conflict,
    Unavailable(String),
    Fatal(AppError),
}

impl From<StoreError> for TxnError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Conflict => TxnError::Conflict,
            StoreError::Unavailable(msg) => TxnError::Unavailable(msg),
            StoreError::Corrupt { id, reason } => TxnError::Fatal(AppError::Internal(format!(
                "corrupt document '{}': {}",
                id, reason
            ))),
        }
    }
}

impl From<AppError> for TxnError {
    fn from(e: AppError) -> Self {
        TxnError::Fatal(e)
    }
}

impl From<InvalidTransition> for TxnError {
    fn from(e: InvalidTransition) -> Self {
        TxnError::Fatal(AppError::InvalidTransition(e.to_string()))
    }
}

/// Servicio autoritativo de capacidad, compartido por la app móvil y la
/// consola de administración
pub struct CapacityService {
    store: Arc<dyn DocumentStore>,
    retry: RetryConfig,
}

impl CapacityService {
    pub fn new(store: Arc<dyn DocumentStore>, retry: RetryConfig) -> Self {
        Self { store, retry }
    }

    // ------------------------------------------------------------------
    // Operaciones públicas
    // ------------------------------------------------------------------

    /// Crea una inscripción PENDING. El chequeo de disponibilidad es de
    /// cortesía: no reserva cupo ni asume que el cupo siga existiendo
    /// cuando corra `approve`.
    pub async fn create_registration(
        &self,
        input: NewRegistration,
    ) -> Result<Registration, AppError> {
        self.run_with_retry("create_registration", || self.create_attempt(&input))
            .await
    }

    /// Aprueba una inscripción PENDING reservando un cupo en la ruta
    /// referenciada, todo en un solo commit atómico.
    pub async fn approve(&self, registration_id: &str) -> Result<Registration, AppError> {
        self.run_with_retry("approve", || self.approve_attempt(registration_id))
            .await
    }

    /// Rechaza una inscripción PENDING. Sin efecto sobre la capacidad.
    pub async fn reject(&self, registration_id: &str) -> Result<Registration, AppError> {
        self.run_with_retry("reject", || self.reject_attempt(registration_id))
            .await
    }

    /// Cancela una inscripción PENDING o APPROVED. Si estaba aprobada,
    /// libera el cupo en el mismo commit.
    pub async fn cancel(&self, registration_id: &str) -> Result<Registration, AppError> {
        self.run_with_retry("cancel", || self.cancel_attempt(registration_id))
            .await
    }

    /// Recalcula `usedCapacity` de cada ruta desde la fuente de verdad
    /// (inscripciones APPROVED) y sobreescribe los contadores. Idempotente
    /// y seguro de correr en cualquier momento.
    pub async fn reconcile(&self, mountain_id: &str) -> Result<Mountain, AppError> {
        self.run_with_retry("reconcile", || self.reconcile_attempt(mountain_id))
            .await
    }

    /// Redimensionado administrativo de una ruta. Rechaza achicar el tope
    /// por debajo del uso ya commiteado.
    pub async fn update_route_capacity(
        &self,
        mountain_id: &str,
        route_id: &str,
        new_max: u32,
        new_status: Option<RouteStatus>,
    ) -> Result<Route, AppError> {
        self.run_with_retry("update_route_capacity", || {
            self.update_capacity_attempt(mountain_id, route_id, new_max, new_status)
        })
        .await
    }

    pub async fn get_mountain(&self, mountain_id: &str) -> Result<Mountain, AppError> {
        self.run_with_retry("get_mountain", || self.get_mountain_attempt(mountain_id))
            .await
    }

    /// Alta/reemplazo administrativo de una montaña. Asigna `routeId` a
    /// toda ruta que no lo traiga: los ids nacen acá y son inmutables.
    pub async fn put_mountain(
        &self,
        mountain_id: &str,
        mut mountain: Mountain,
    ) -> Result<Mountain, AppError> {
        for route in mountain.routes.iter_mut() {
            if route.route_id.is_none() {
                route.route_id = Some(Uuid::new_v4().to_string());
            }
        }
        self.run_with_retry("put_mountain", || self.put_mountain_attempt(mountain_id, &mountain))
            .await
    }

    /// Listado para la pantalla de aprobación del admin, ordenado por
    /// fecha de creación
    pub async fn list_registrations(
        &self,
        mountain_id: &str,
    ) -> Result<Vec<Registration>, AppError> {
        self.run_with_retry("list_registrations", || self.list_attempt(mountain_id))
            .await
    }

    // ------------------------------------------------------------------
    // Intentos de transacción
    // ------------------------------------------------------------------

    async fn create_attempt(&self, input: &NewRegistration) -> Result<Registration, TxnError> {
        let (_, mountain) = self.read_mountain(&input.mountain_id).await?;

        let route = mountain
            .route(input.route_id.as_deref(), input.route_name.as_deref())
            .ok_or_else(|| {
                TxnError::Fatal(AppError::RouteNotFound(route_label(
                    input.route_id.as_deref(),
                    input.route_name.as_deref(),
                )))
            })?;

        match route.availability() {
            RouteAvailability::Closed => {
                return Err(TxnError::Fatal(AppError::RouteClosed(route.name.clone())))
            }
            RouteAvailability::Full => {
                return Err(TxnError::Fatal(AppError::RouteFull(route.name.clone())))
            }
            RouteAvailability::Available => {}
        }

        // Se guardan las referencias resueltas: routeId de la ruta (si la
        // entrada legacy no tiene, queda None y el nombre sigue de fallback)
        let registration = Registration::new(
            input.user_id.clone(),
            input.mountain_id.clone(),
            route.route_id.clone(),
            route.name.clone(),
        );

        self.store
            .commit(vec![Mutation::create(
                REGISTRATIONS,
                registration.registration_id.to_string(),
                &registration,
            )?])
            .await?;

        log::info!(
            "📝 Inscripción {} creada en PENDING para la ruta '{}'",
            registration.registration_id,
            registration.route_name
        );
        Ok(registration)
    }

    async fn approve_attempt(&self, registration_id: &str) -> Result<Registration, TxnError> {
        let (reg_version, registration) = self.read_registration(registration_id).await?;
        let (approved, effect) = registration.apply(RegistrationEvent::Approve)?;
        debug_assert_eq!(effect, CapacityEffect::Reserve);

        let mountain_doc = self
            .store
            .get(MOUNTAINS, &registration.mountain_id)
            .await?
            .ok_or_else(|| {
                TxnError::Fatal(AppError::RouteNotFound(format!(
                    "mountain '{}' referenced by registration {} no longer exists",
                    registration.mountain_id, registration_id
                )))
            })?;
        let mut mountain: Mountain = mountain_doc.decode()?;

        let idx = mountain
            .find_route(
                registration.route_id.as_deref(),
                Some(&registration.route_name),
            )
            .ok_or_else(|| {
                TxnError::Fatal(AppError::RouteNotFound(route_label(
                    registration.route_id.as_deref(),
                    Some(&registration.route_name),
                )))
            })?;

        let reserved = mountain.routes[idx].reserve().map_err(|e| {
            TxnError::Fatal(match e.availability {
                RouteAvailability::Closed => AppError::RouteClosed(e.route),
                _ => AppError::RouteFull(e.route),
            })
        })?;
        mountain.routes[idx] = reserved;

        self.store
            .commit(vec![
                Mutation::update(
                    MOUNTAINS,
                    registration.mountain_id.as_str(),
                    mountain_doc.version,
                    &mountain,
                )?,
                Mutation::update(REGISTRATIONS, registration_id, reg_version, &approved)?,
            ])
            .await?;

        log::info!(
            "✅ Inscripción {} aprobada: ruta '{}' queda {}/{}",
            registration_id,
            mountain.routes[idx].name,
            mountain.routes[idx].used_capacity,
            mountain.routes[idx].max_capacity
        );
        Ok(approved)
    }

    async fn reject_attempt(&self, registration_id: &str) -> Result<Registration, TxnError> {
        let (version, registration) = self.read_registration(registration_id).await?;
        let (rejected, effect) = registration.apply(RegistrationEvent::Reject)?;
        debug_assert_eq!(effect, CapacityEffect::None);

        self.store
            .commit(vec![Mutation::update(
                REGISTRATIONS,
                registration_id,
                version,
                &rejected,
            )?])
            .await?;

        log::info!("🚫 Inscripción {} rechazada", registration_id);
        Ok(rejected)
    }

    async fn cancel_attempt(&self, registration_id: &str) -> Result<Registration, TxnError> {
        let (reg_version, registration) = self.read_registration(registration_id).await?;
        let (cancelled, effect) = registration.apply(RegistrationEvent::Cancel)?;

        let mut mutations = Vec::with_capacity(2);
        if effect == CapacityEffect::Release {
            // La liberación va en el mismo commit que el cambio de estado.
            // Referencias colgantes (montaña o ruta borrada/renombrada) se
            // toleran: se cancela igual, sin liberar nada.
            match self.store.get(MOUNTAINS, &registration.mountain_id).await? {
                Some(mountain_doc) => {
                    let mut mountain: Mountain = mountain_doc.decode()?;
                    match mountain.find_route(
                        registration.route_id.as_deref(),
                        Some(&registration.route_name),
                    ) {
                        Some(idx) => {
                            mountain.routes[idx] = mountain.routes[idx].release();
                            mutations.push(Mutation::update(
                                MOUNTAINS,
                                registration.mountain_id.as_str(),
                                mountain_doc.version,
                                &mountain,
                            )?);
                        }
                        None => log::warn!(
                            "⚠️ Inscripción {} referencia una ruta inexistente; se cancela sin liberar cupo",
                            registration_id
                        ),
                    }
                }
                None => log::warn!(
                    "⚠️ Inscripción {} referencia una montaña inexistente; se cancela sin liberar cupo",
                    registration_id
                ),
            }
        }
        mutations.push(Mutation::update(
            REGISTRATIONS,
            registration_id,
            reg_version,
            &cancelled,
        )?);

        self.store.commit(mutations).await?;

        log::info!("↩️ Inscripción {} cancelada", registration_id);
        Ok(cancelled)
    }

    async fn reconcile_attempt(&self, mountain_id: &str) -> Result<Mountain, TxnError> {
        let (mountain_version, mut mountain) = self.read_mountain(mountain_id).await?;

        let docs = self
            .store
            .query_eq(REGISTRATIONS, "mountainId", mountain_id)
            .await?;

        let mut counts = vec![0u32; mountain.routes.len()];
        for doc in &docs {
            // Todo-o-nada: un documento que no decodifica aborta la
            // reparación en vez de reconciliar con datos parciales
            let registration: Registration = doc.decode()?;
            if registration.status != RegistrationStatus::Approved {
                continue;
            }
            match mountain.find_route(
                registration.route_id.as_deref(),
                Some(&registration.route_name),
            ) {
                Some(idx) => counts[idx] += 1,
                None => log::warn!(
                    "⚠️ Inscripción aprobada {} referencia una ruta inexistente en '{}'",
                    doc.id,
                    mountain_id
                ),
            }
        }

        for (route, count) in mountain.routes.iter_mut().zip(counts) {
            if route.used_capacity != count {
                log::info!(
                    "🔧 Reconcile '{}': ruta '{}' pasa de {} a {}",
                    mountain_id,
                    route.name,
                    route.used_capacity,
                    count
                );
            }
            route.used_capacity = count;
        }

        self.store
            .commit(vec![Mutation::update(
                MOUNTAINS,
                mountain_id,
                mountain_version,
                &mountain,
            )?])
            .await?;

        Ok(mountain)
    }

    async fn update_capacity_attempt(
        &self,
        mountain_id: &str,
        route_id: &str,
        new_max: u32,
        new_status: Option<RouteStatus>,
    ) -> Result<Route, TxnError> {
        let (mountain_version, mut mountain) = self.read_mountain(mountain_id).await?;

        let idx = mountain
            .find_route(Some(route_id), None)
            .ok_or_else(|| TxnError::Fatal(AppError::RouteNotFound(route_id.to_string())))?;

        let route = &mut mountain.routes[idx];
        if new_max < route.used_capacity {
            return Err(TxnError::Fatal(AppError::CapacityBelowUsage {
                route: route.name.clone(),
                used_capacity: route.used_capacity,
                new_max,
            }));
        }
        route.max_capacity = new_max;
        if let Some(status) = new_status {
            route.status = status;
        }
        let updated = route.clone();

        self.store
            .commit(vec![Mutation::update(
                MOUNTAINS,
                mountain_id,
                mountain_version,
                &mountain,
            )?])
            .await?;

        log::info!(
            "⚙️ Ruta '{}' redimensionada a {} cupos ({:?})",
            updated.name,
            updated.max_capacity,
            updated.status
        );
        Ok(updated)
    }

    async fn get_mountain_attempt(&self, mountain_id: &str) -> Result<Mountain, TxnError> {
        self.read_mountain(mountain_id).await.map(|(_, m)| m)
    }

    async fn put_mountain_attempt(
        &self,
        mountain_id: &str,
        mountain: &Mountain,
    ) -> Result<Mountain, TxnError> {
        self.store
            .commit(vec![Mutation::put(MOUNTAINS, mountain_id, mountain)?])
            .await?;
        log::info!(
            "🗻 Montaña '{}' guardada con {} rutas",
            mountain_id,
            mountain.routes.len()
        );
        Ok(mountain.clone())
    }

    async fn list_attempt(&self, mountain_id: &str) -> Result<Vec<Registration>, TxnError> {
        let docs = self
            .store
            .query_eq(REGISTRATIONS, "mountainId", mountain_id)
            .await?;
        let mut registrations = Vec::with_capacity(docs.len());
        for doc in &docs {
            match doc.decode::<Registration>() {
                Ok(registration) => registrations.push(registration),
                Err(e) => log::warn!("⚠️ Se omite documento corrupto en el listado: {}", e),
            }
        }
        registrations.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(registrations)
    }

    // ------------------------------------------------------------------
    // Lecturas tipadas y loop de reintentos
    // ------------------------------------------------------------------

    async fn read_mountain(&self, mountain_id: &str) -> Result<(u64, Mountain), TxnError> {
        let doc = self
            .store
            .get(MOUNTAINS, mountain_id)
            .await?
            .ok_or_else(|| TxnError::Fatal(AppError::MountainNotFound(mountain_id.to_string())))?;
        let mountain = doc.decode()?;
        Ok((doc.version, mountain))
    }

    async fn read_registration(
        &self,
        registration_id: &str,
    ) -> Result<(u64, Registration), TxnError> {
        let doc = self
            .store
            .get(REGISTRATIONS, registration_id)
            .await?
            .ok_or_else(|| {
                TxnError::Fatal(AppError::RegistrationNotFound(registration_id.to_string()))
            })?;
        let registration = doc.decode()?;
        Ok((doc.version, registration))
    }

    /// Corre un intento bajo deadline y reintenta conflictos y fallas
    /// transitorias con backoff. Agotado el presupuesto, clasifica: si lo
    /// último fue una falla de transporte devuelve StoreUnavailable, si no
    /// Contention.
    async fn run_with_retry<T, F, Fut>(&self, op: &'static str, mut attempt: F) -> Result<T, AppError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TxnError>>,
    {
        let mut unavailable: Option<String> = None;
        for n in 1..=self.retry.max_attempts {
            if n > 1 {
                tokio::time::sleep(self.retry.delay_for(n - 1)).await;
            }
            match tokio::time::timeout(self.retry.attempt_timeout(), attempt()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(TxnError::Fatal(e))) => return Err(e),
                Ok(Err(TxnError::Conflict)) => {
                    log::warn!(
                        "⚠️ Conflicto de escritura en {} (intento {}/{})",
                        op,
                        n,
                        self.retry.max_attempts
                    );
                    unavailable = None;
                }
                Ok(Err(TxnError::Unavailable(msg))) => {
                    log::warn!(
                        "⚠️ Store no disponible en {} (intento {}/{}): {}",
                        op,
                        n,
                        self.retry.max_attempts,
                        msg
                    );
                    unavailable = Some(msg);
                }
                Err(_) => {
                    log::warn!(
                        "⚠️ Deadline excedido en {} (intento {}/{})",
                        op,
                        n,
                        self.retry.max_attempts
                    );
                    unavailable = None;
                }
            }
        }
        match unavailable {
            Some(msg) => Err(AppError::StoreUnavailable(msg)),
            None => Err(AppError::Contention {
                attempts: self.retry.max_attempts,
            }),
        }
    }
}

fn route_label(route_id: Option<&str>, name: Option<&str>) -> String {
    match (route_id, name) {
        (Some(id), _) => format!("routeId '{}'", id),
        (None, Some(name)) => format!("route named '{}'", name),
        (None, None) => "unspecified route".to_string(),
    }
}

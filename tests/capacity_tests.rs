//! Tests de propiedades del servicio de capacidad sobre el store en
//! memoria: no-overbooking bajo concurrencia, liberación correcta,
//! reconciliación idempotente y transiciones ilegales.

use std::sync::Arc;

use futures::future::join_all;
use serde_json::json;

use hiking_registration::models::{
    Mountain, Registration, RegistrationStatus, Route, RouteStatus,
};
use hiking_registration::services::capacity_service::{CapacityService, NewRegistration};
use hiking_registration::store::{DocumentStore, MemoryStore, Mutation, MOUNTAINS, REGISTRATIONS};
use hiking_registration::utils::backoff::RetryConfig;
use hiking_registration::utils::errors::AppError;

const MOUNTAIN_ID: &str = "cerro-tres-picos";

fn route(route_id: &str, name: &str, max: u32, used: u32, status: RouteStatus) -> Route {
    Route {
        route_id: Some(route_id.to_string()),
        name: name.to_string(),
        max_capacity: max,
        used_capacity: used,
        status,
    }
}

fn mountain(routes: Vec<Route>) -> Mountain {
    Mountain {
        name: "Cerro Tres Picos".to_string(),
        description: None,
        routes,
    }
}

async fn seed(store: &MemoryStore, mountain: &Mountain) {
    store
        .commit(vec![Mutation::put(MOUNTAINS, MOUNTAIN_ID, mountain).unwrap()])
        .await
        .unwrap();
}

fn service(store: &MemoryStore) -> CapacityService {
    CapacityService::new(Arc::new(store.clone()), RetryConfig::fast())
}

async fn used_capacity(store: &MemoryStore, route_id: &str) -> u32 {
    let doc = store.get(MOUNTAINS, MOUNTAIN_ID).await.unwrap().unwrap();
    let mountain: Mountain = doc.decode().unwrap();
    let route = mountain
        .routes
        .iter()
        .find(|r| r.route_id.as_deref() == Some(route_id))
        .unwrap();
    assert!(
        route.used_capacity <= route.max_capacity,
        "invariante violado: {}/{} en '{}'",
        route.used_capacity,
        route.max_capacity,
        route.name
    );
    route.used_capacity
}

async fn create_pending(svc: &CapacityService, user_id: &str, route_id: &str) -> Registration {
    svc.create_registration(NewRegistration {
        user_id: user_id.to_string(),
        mountain_id: MOUNTAIN_ID.to_string(),
        route_id: Some(route_id.to_string()),
        route_name: None,
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn test_scenario_approve_cancel_reapprove() {
    let store = MemoryStore::new();
    seed(&store, &mountain(vec![route("r-1", "Normal", 2, 0, RouteStatus::Open)])).await;
    let svc = service(&store);

    let a = create_pending(&svc, "ana", "r-1").await;
    let b = create_pending(&svc, "bruno", "r-1").await;
    let c = create_pending(&svc, "carla", "r-1").await;
    assert_eq!(used_capacity(&store, "r-1").await, 0);

    svc.approve(&a.registration_id.to_string()).await.unwrap();
    assert_eq!(used_capacity(&store, "r-1").await, 1);

    svc.approve(&b.registration_id.to_string()).await.unwrap();
    assert_eq!(used_capacity(&store, "r-1").await, 2);

    let err = svc.approve(&c.registration_id.to_string()).await.unwrap_err();
    assert!(matches!(err, AppError::RouteFull(_)), "esperaba RouteFull, vino {:?}", err);
    assert_eq!(used_capacity(&store, "r-1").await, 2);

    // C sigue PENDING, no quedó quemada por el intento fallido
    svc.cancel(&a.registration_id.to_string()).await.unwrap();
    assert_eq!(used_capacity(&store, "r-1").await, 1);

    svc.approve(&c.registration_id.to_string()).await.unwrap();
    assert_eq!(used_capacity(&store, "r-1").await, 2);
}

#[tokio::test]
async fn test_no_overbooking_under_contention() {
    let store = MemoryStore::new();
    seed(&store, &mountain(vec![route("r-1", "Normal", 1, 0, RouteStatus::Open)])).await;
    let svc = Arc::new(service(&store));

    let a = create_pending(&svc, "ana", "r-1").await;
    let b = create_pending(&svc, "bruno", "r-1").await;

    let tasks: Vec<_> = [a.registration_id, b.registration_id]
        .into_iter()
        .map(|id| {
            let svc = svc.clone();
            tokio::spawn(async move { svc.approve(&id.to_string()).await })
        })
        .collect();

    let results: Vec<_> = join_all(tasks)
        .await
        .into_iter()
        .map(|joined| joined.unwrap())
        .collect();

    let approved = results.iter().filter(|r| r.is_ok()).count();
    let full = results
        .iter()
        .filter(|r| matches!(r, Err(AppError::RouteFull(_))))
        .count();
    assert_eq!(approved, 1, "exactamente una aprobación debe ganar");
    assert_eq!(full, 1, "la otra debe observar la ruta llena");
    assert_eq!(used_capacity(&store, "r-1").await, 1);
}

#[tokio::test]
async fn test_pending_registrations_do_not_hold_slots() {
    // Política de lista de espera: con un solo cupo restante pueden
    // existir muchas PENDING; el chequeo de create es solo de cortesía
    let store = MemoryStore::new();
    seed(&store, &mountain(vec![route("r-1", "Normal", 1, 0, RouteStatus::Open)])).await;
    let svc = service(&store);

    let a = create_pending(&svc, "ana", "r-1").await;
    let b = create_pending(&svc, "bruno", "r-1").await;
    let c = create_pending(&svc, "carla", "r-1").await;
    assert_eq!(used_capacity(&store, "r-1").await, 0);

    svc.approve(&a.registration_id.to_string()).await.unwrap();
    for pending in [&b, &c] {
        let err = svc.approve(&pending.registration_id.to_string()).await.unwrap_err();
        assert!(matches!(err, AppError::RouteFull(_)));
    }
    assert_eq!(used_capacity(&store, "r-1").await, 1);
}

#[tokio::test]
async fn test_create_is_advisory_only() {
    let store = MemoryStore::new();
    seed(
        &store,
        &mountain(vec![
            route("r-full", "Llena", 1, 1, RouteStatus::Open),
            route("r-closed", "Cerrada", 5, 0, RouteStatus::Closed),
        ]),
    )
    .await;
    let svc = service(&store);

    let err = svc
        .create_registration(NewRegistration {
            user_id: "ana".to_string(),
            mountain_id: MOUNTAIN_ID.to_string(),
            route_id: Some("r-full".to_string()),
            route_name: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::RouteFull(_)));

    let err = svc
        .create_registration(NewRegistration {
            user_id: "ana".to_string(),
            mountain_id: MOUNTAIN_ID.to_string(),
            route_id: Some("r-closed".to_string()),
            route_name: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::RouteClosed(_)));
}

#[tokio::test]
async fn test_reject_and_cancel_from_pending_are_noops_on_capacity() {
    let store = MemoryStore::new();
    seed(&store, &mountain(vec![route("r-1", "Normal", 3, 1, RouteStatus::Open)])).await;
    let svc = service(&store);

    let a = create_pending(&svc, "ana", "r-1").await;
    let b = create_pending(&svc, "bruno", "r-1").await;

    let rejected = svc.reject(&a.registration_id.to_string()).await.unwrap();
    assert_eq!(rejected.status, RegistrationStatus::Rejected);
    assert_eq!(used_capacity(&store, "r-1").await, 1);

    let cancelled = svc.cancel(&b.registration_id.to_string()).await.unwrap();
    assert_eq!(cancelled.status, RegistrationStatus::Cancelled);
    assert_eq!(used_capacity(&store, "r-1").await, 1);
}

#[tokio::test]
async fn test_cancel_approved_releases_and_clamps_under_drift() {
    let store = MemoryStore::new();
    seed(&store, &mountain(vec![route("r-1", "Normal", 2, 0, RouteStatus::Open)])).await;
    let svc = service(&store);

    let a = create_pending(&svc, "ana", "r-1").await;
    svc.approve(&a.registration_id.to_string()).await.unwrap();
    assert_eq!(used_capacity(&store, "r-1").await, 1);

    // Drift externo: alguien ya bajó el contador a cero a mano
    seed(&store, &mountain(vec![route("r-1", "Normal", 2, 0, RouteStatus::Open)])).await;

    // Cancelar la aprobada no puede dejar el contador negativo
    svc.cancel(&a.registration_id.to_string()).await.unwrap();
    assert_eq!(used_capacity(&store, "r-1").await, 0);
}

#[tokio::test]
async fn test_cancel_tolerates_dangling_route() {
    let store = MemoryStore::new();
    seed(&store, &mountain(vec![route("r-1", "Normal", 2, 0, RouteStatus::Open)])).await;
    let svc = service(&store);

    let a = create_pending(&svc, "ana", "r-1").await;
    svc.approve(&a.registration_id.to_string()).await.unwrap();

    // Un admin borra la ruta; la inscripción queda colgante
    seed(&store, &mountain(vec![])).await;

    let cancelled = svc.cancel(&a.registration_id.to_string()).await.unwrap();
    assert_eq!(cancelled.status, RegistrationStatus::Cancelled);
}

#[tokio::test]
async fn test_illegal_transitions_are_rejected() {
    let store = MemoryStore::new();
    seed(&store, &mountain(vec![route("r-1", "Normal", 5, 0, RouteStatus::Open)])).await;
    let svc = service(&store);

    let a = create_pending(&svc, "ana", "r-1").await;
    let id = a.registration_id.to_string();

    svc.approve(&id).await.unwrap();
    let err = svc.approve(&id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));
    // El doble approve no reservó un segundo cupo
    assert_eq!(used_capacity(&store, "r-1").await, 1);

    let b = create_pending(&svc, "bruno", "r-1").await;
    let b_id = b.registration_id.to_string();
    svc.reject(&b_id).await.unwrap();
    let err = svc.cancel(&b_id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidTransition(_)));

    let err = svc.approve("00000000-0000-0000-0000-000000000000").await.unwrap_err();
    assert!(matches!(err, AppError::RegistrationNotFound(_)));
}

#[tokio::test]
async fn test_reconcile_repairs_drift_and_is_idempotent() {
    let store = MemoryStore::new();
    seed(&store, &mountain(vec![route("r-1", "Normal", 10, 0, RouteStatus::Open)])).await;
    let svc = service(&store);

    let a = create_pending(&svc, "ana", "r-1").await;
    let b = create_pending(&svc, "bruno", "r-1").await;
    let _c = create_pending(&svc, "carla", "r-1").await;
    svc.approve(&a.registration_id.to_string()).await.unwrap();
    svc.approve(&b.registration_id.to_string()).await.unwrap();
    assert_eq!(used_capacity(&store, "r-1").await, 2);

    // Edición manual rompe el contador
    seed(&store, &mountain(vec![route("r-1", "Normal", 10, 7, RouteStatus::Open)])).await;
    assert_eq!(used_capacity(&store, "r-1").await, 7);

    let repaired = svc.reconcile(MOUNTAIN_ID).await.unwrap();
    assert_eq!(repaired.routes[0].used_capacity, 2);
    assert_eq!(used_capacity(&store, "r-1").await, 2);

    // Idempotente: correrlo de nuevo no cambia nada
    let repaired = svc.reconcile(MOUNTAIN_ID).await.unwrap();
    assert_eq!(repaired.routes[0].used_capacity, 2);
    assert_eq!(used_capacity(&store, "r-1").await, 2);
}

#[tokio::test]
async fn test_reconcile_counts_legacy_registrations_by_name() {
    let store = MemoryStore::new();
    seed(&store, &mountain(vec![route("r-1", "Normal", 10, 0, RouteStatus::Open)])).await;
    let svc = service(&store);

    // Inscripción legacy aprobada: sin routeId, solo el nombre denormalizado
    store
        .commit(vec![Mutation::put(
            REGISTRATIONS,
            "legacy-1",
            &json!({
                "registrationId": "7d4e1f7a-3b2c-4d5e-9f8a-1b2c3d4e5f6a",
                "userId": "diego",
                "mountainId": MOUNTAIN_ID,
                "routeName": "Normal",
                "status": "approved",
                "createdAt": "2026-03-15T09:30:00Z"
            }),
        )
        .unwrap()])
        .await
        .unwrap();

    let repaired = svc.reconcile(MOUNTAIN_ID).await.unwrap();
    assert_eq!(repaired.routes[0].used_capacity, 1);
}

#[tokio::test]
async fn test_legacy_route_resolution_by_name() {
    let store = MemoryStore::new();
    // Ruta legacy sin routeId, seedeada directo al store (put_mountain
    // le asignaría un id)
    seed(
        &store,
        &mountain(vec![Route {
            route_id: None,
            name: "Camino Viejo".to_string(),
            max_capacity: 2,
            used_capacity: 0,
            status: RouteStatus::Open,
        }]),
    )
    .await;
    let svc = service(&store);

    let reg = svc
        .create_registration(NewRegistration {
            user_id: "ana".to_string(),
            mountain_id: MOUNTAIN_ID.to_string(),
            route_id: None,
            route_name: Some("Camino Viejo".to_string()),
        })
        .await
        .unwrap();
    assert_eq!(reg.route_id, None);
    assert_eq!(reg.route_name, "Camino Viejo");

    svc.approve(&reg.registration_id.to_string()).await.unwrap();

    let doc = store.get(MOUNTAINS, MOUNTAIN_ID).await.unwrap().unwrap();
    let m: Mountain = doc.decode().unwrap();
    assert_eq!(m.routes[0].used_capacity, 1);
}

#[tokio::test]
async fn test_update_route_capacity_rejects_shrink_below_usage() {
    let store = MemoryStore::new();
    seed(&store, &mountain(vec![route("r-1", "Normal", 3, 0, RouteStatus::Open)])).await;
    let svc = service(&store);

    let a = create_pending(&svc, "ana", "r-1").await;
    let b = create_pending(&svc, "bruno", "r-1").await;
    svc.approve(&a.registration_id.to_string()).await.unwrap();
    svc.approve(&b.registration_id.to_string()).await.unwrap();

    let err = svc
        .update_route_capacity(MOUNTAIN_ID, "r-1", 1, None)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::CapacityBelowUsage { .. }));
    // El tope no cambió
    let m = svc.get_mountain(MOUNTAIN_ID).await.unwrap();
    assert_eq!(m.routes[0].max_capacity, 3);

    // Achicar hasta el uso actual sí se permite
    let updated = svc
        .update_route_capacity(MOUNTAIN_ID, "r-1", 2, None)
        .await
        .unwrap();
    assert_eq!(updated.max_capacity, 2);
    assert!(updated.is_full());
}

#[tokio::test]
async fn test_closing_a_route_blocks_pending_approvals() {
    let store = MemoryStore::new();
    seed(&store, &mountain(vec![route("r-1", "Normal", 5, 0, RouteStatus::Open)])).await;
    let svc = service(&store);

    let a = create_pending(&svc, "ana", "r-1").await;
    svc.update_route_capacity(MOUNTAIN_ID, "r-1", 5, Some(RouteStatus::Closed))
        .await
        .unwrap();

    let err = svc.approve(&a.registration_id.to_string()).await.unwrap_err();
    assert!(matches!(err, AppError::RouteClosed(_)));
    assert_eq!(used_capacity(&store, "r-1").await, 0);
}

#[tokio::test]
async fn test_put_mountain_assigns_route_ids() {
    let store = MemoryStore::new();
    let svc = service(&store);

    let saved = svc
        .put_mountain(
            MOUNTAIN_ID,
            mountain(vec![Route {
                route_id: None,
                name: "Nueva".to_string(),
                max_capacity: 4,
                used_capacity: 0,
                status: RouteStatus::Open,
            }]),
        )
        .await
        .unwrap();
    assert!(saved.routes[0].route_id.is_some());

    let err = svc.get_mountain("no-existe").await.unwrap_err();
    assert!(matches!(err, AppError::MountainNotFound(_)));
}

#[tokio::test]
async fn test_list_registrations_sorted_by_creation() {
    let store = MemoryStore::new();
    seed(&store, &mountain(vec![route("r-1", "Normal", 5, 0, RouteStatus::Open)])).await;
    let svc = service(&store);

    let a = create_pending(&svc, "ana", "r-1").await;
    let b = create_pending(&svc, "bruno", "r-1").await;

    let listed = svc.list_registrations(MOUNTAIN_ID).await.unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(listed[0].registration_id, a.registration_id);
    assert_eq!(listed[1].registration_id, b.registration_id);
    assert!(listed[0].created_at <= listed[1].created_at);
}

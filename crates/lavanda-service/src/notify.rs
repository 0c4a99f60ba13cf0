use chrono::{DateTime, Utc};
use lavanda_core::config::TrackingConfig;
use std::sync::Mutex;

// ---------------------------------------------------------------------------
// Notifier
// ---------------------------------------------------------------------------

/// Fire-and-forget seam to the customer messaging channel. The service never
/// awaits or inspects the outcome; a lost message never fails a transition.
pub trait Notifier: Send + Sync {
    fn send(&self, phone: &str, body: &str);
}

/// Default collaborator: logs the notification instead of delivering it.
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn send(&self, phone: &str, body: &str) {
        tracing::info!(phone, chars = body.len(), "notification sent");
        tracing::debug!(body, "notification body");
    }
}

/// Recording double for tests and local front-ends.
#[derive(Default)]
pub struct MemoryNotifier {
    sent: Mutex<Vec<(String, String)>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

impl Notifier for MemoryNotifier {
    fn send(&self, phone: &str, body: &str) {
        self.sent
            .lock()
            .unwrap()
            .push((phone.to_string(), body.to_string()));
    }
}

// ---------------------------------------------------------------------------
// Message templates
// ---------------------------------------------------------------------------

pub fn processing_started(config: &TrackingConfig, order_number: &str) -> String {
    format!(
        "Hola! Tu pedido {order_number} fue recibido en {business} y ya se \
         está procesando.\n\nPuedes seguirlo en cualquier momento en \
         {url} con tu número de orden.\n\nGracias por confiar en nosotros!",
        business = config.business.name,
        url = config.business.tracking_url,
    )
}

pub fn ready_for_pickup(
    config: &TrackingConfig,
    order_number: &str,
    deadline: DateTime<Utc>,
) -> String {
    format!(
        "Buenas noticias! Tu pedido {order_number} está listo para retiro en \
         {business}.\n\nFecha límite de retiro: {deadline}.\n\nRecuerda traer \
         tu comprobante. Te esperamos!",
        business = config.business.name,
        deadline = deadline.format("%d-%m-%Y"),
    )
}

pub fn dispatch_started(order_number: &str, driver: &str, vehicle: &str, plate: &str) -> String {
    format!(
        "Tu pedido {order_number} va en camino!\n\nRepartidor: {driver}\n\
         Vehículo: {vehicle}\nPatente: {plate}\n\nEl repartidor llegará \
         pronto a tu domicilio. Gracias por tu preferencia!"
    )
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

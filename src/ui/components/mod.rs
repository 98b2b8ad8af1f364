pub mod availability_badge;
pub mod kpi_card;
pub mod payment_qr;
pub mod toast;

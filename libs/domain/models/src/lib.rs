// [libs/domain/models/src/lib.rs]
/*!
 * =================================================================
 * APARATO: WATER BALANCE DOMAIN MODELS (V1.0)
 * CLASIFICACION: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: SINGLE SOURCE OF TRUTH DE ENTIDADES Y DTOs
 *
 * Definiciones de tipos compartidos para el Motor de Balance Hidrico:
 * facilities, fuentes, mediciones, balances mensuales, transferencias
 * de bombeo y el registro de licencias.
 * =================================================================
 */

pub mod balance;
pub mod cache_event;
pub mod constant;
pub mod facility;
pub mod license;
pub mod measurement;
pub mod overrides;
pub mod source;
pub mod transfer;

pub use balance::{Balance, CalcType, CapacityWarning, DataQualityFlag, FacilityBalanceSnapshot};
pub use cache_event::CacheEvent;
pub use constant::Constant;
pub use facility::Facility;
pub use license::{AuditEventType, AuditLogEntry, HardwareComponents, License, LicenseState, LicenseTier};
pub use measurement::{Measurement, QualityFlag};
pub use overrides::{ManualOverride, TailingsMoistureMonthly};
pub use source::{Source, SourceType};
pub use transfer::{PumpTransferEvent, Transfer};

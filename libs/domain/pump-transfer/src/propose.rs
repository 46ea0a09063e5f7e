// [libs/domain/pump-transfer/src/propose.rs]
/*!
 * APARATO: GENERADOR DE PROPUESTAS DE TRANSFERENCIA
 * RESPONSABILIDAD: ALGORITMO DETERMINISTA DE REDISTRIBUCION DE AGUA
 *
 * `propose_transfers` is pure: it reads the facility
 * graph and returns a proposal list, never mutating anything. The
 * destination loop for one source always tries every `feeds_to`
 * destination in order and accumulates across all of them until the
 * 5% source increment is exhausted — it does not stop at the first
 * destination that absorbs water. This resolves the open question of
 * open question (§9) in favour of "continue", matching the audit
 * document's stated intent over the contradictory early-break code
 * path.
 */

use chrono::NaiveDate;
use wbe_domain_models::facility::Facility;
use wbe_domain_models::transfer::Transfer;

/// Fraction of a source facility's total capacity moved per proposal
/// round.
pub const TRANSFER_INCREMENT_FRACTION: f64 = 0.05;

/// `propose_transfers(date) -> [Transfer]`. Facilities
/// are iterated in stable `facility_code` order; the caller is
/// expected to have already sorted `facilities`, but this function
/// sorts defensively so determinism never depends on caller discipline.
pub fn propose_transfers(date: NaiveDate, facilities: &[Facility]) -> Vec<Transfer> {
    let mut ordered: Vec<&Facility> = facilities.iter().collect();
    ordered.sort_by(|a, b| a.facility_code.cmp(&b.facility_code));

    let by_code = |code: &str| ordered.iter().find(|f| f.facility_code == code).copied();

    let mut proposals = Vec::new();

    for source in ordered.iter() {
        if !source.active || source.feeds_to.is_empty() {
            continue;
        }
        let source_level_pct = source.level_pct();
        if source_level_pct < source.pump_start_pct {
            continue;
        }

        let mut remaining = source.total_capacity_m3 * TRANSFER_INCREMENT_FRACTION;
        let mut cumulative_taken = 0.0;

        for dest_code in source.feeds_to.iter() {
            if remaining <= 0.0 {
                break;
            }
            let Some(dest) = by_code(dest_code) else { continue };
            if !dest.active {
                continue;
            }

            let dest_level_pct = dest.level_pct();
            if dest_level_pct >= dest.pump_start_pct {
                // Destination is already at or above its own
                // threshold — treated as full for receiving purposes.
                continue;
            }

            let space = dest.total_capacity_m3 - dest.current_volume_m3;
            let take = remaining.min(space);
            if take <= 0.0 {
                continue;
            }

            cumulative_taken += take;
            let source_level_after_pct = if source.total_capacity_m3 > 0.0 {
                100.0 * (source.current_volume_m3 - cumulative_taken) / source.total_capacity_m3
            } else {
                0.0
            };
            let dest_level_after_pct = if dest.total_capacity_m3 > 0.0 {
                100.0 * (dest.current_volume_m3 + take) / dest.total_capacity_m3
            } else {
                0.0
            };

            proposals.push(Transfer {
                calc_date: date,
                source_code: source.facility_code.clone(),
                dest_code: dest.facility_code.clone(),
                volume_m3: take,
                source_level_before_pct: source_level_pct,
                dest_level_before_pct: dest_level_pct,
                source_level_after_pct,
                dest_level_after_pct,
            });

            remaining -= take;
        }
    }

    proposals
}

#[cfg(test)]
mod tests {
    use super::*;

    fn facility(code: &str, cap: f64, current: f64, start_pct: f64, feeds_to: Vec<&str>) -> Facility {
        Facility {
            facility_code: code.into(),
            total_capacity_m3: cap,
            surface_area_m2: 1_000.0,
            is_lined: true,
            evap_active: false,
            pump_start_pct: start_pct,
            pump_stop_pct: start_pct,
            feeds_to: feeds_to.into_iter().map(String::from).collect(),
            active: true,
            current_volume_m3: current,
            minimum_volume_m3: 0.0,
            average_daily_consumption_m3: 0.0,
            area_code: "UG2N".into(),
        }
    }

    #[test]
    fn single_transfer_matches_scenario_s1() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();
        let facilities = vec![
            facility("SRC", 100_000.0, 80_000.0, 70.0, vec!["DST"]),
            facility("DST", 100_000.0, 60_000.0, 70.0, vec![]),
        ];
        let proposals = propose_transfers(date, &facilities);
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].source_code, "SRC");
        assert_eq!(proposals[0].dest_code, "DST");
        assert_eq!(proposals[0].volume_m3, 5_000.0);
    }

    #[test]
    fn below_start_threshold_proposes_nothing() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();
        let facilities = vec![
            facility("SRC", 100_000.0, 50_000.0, 70.0, vec!["DST"]),
            facility("DST", 100_000.0, 10_000.0, 70.0, vec![]),
        ];
        assert!(propose_transfers(date, &facilities).is_empty());
    }

    #[test]
    fn continues_across_multiple_destinations() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();
        let facilities = vec![
            facility("SRC", 100_000.0, 90_000.0, 70.0, vec!["DST-A", "DST-B"]),
            // DST-A sits below its own pump_start_pct (so the "already
            // full" skip does not fire) but has only 1000 m3 of actual
            // space left — the remainder must roll over to DST-B.
            facility("DST-A", 100_000.0, 99_000.0, 99.5, vec![]),
            facility("DST-B", 100_000.0, 10_000.0, 70.0, vec![]),
        ];
        let proposals = propose_transfers(date, &facilities);
        // DST-A has only 1000 m3 of space; the remaining 4000 m3 of the
        // 5% increment continues on to DST-B instead of stopping.
        assert_eq!(proposals.len(), 2);
        assert_eq!(proposals[0].dest_code, "DST-A");
        assert_eq!(proposals[0].volume_m3, 1_000.0);
        assert_eq!(proposals[1].dest_code, "DST-B");
        assert_eq!(proposals[1].volume_m3, 4_000.0);
    }

    #[test]
    fn inactive_source_is_skipped() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();
        let mut src = facility("SRC", 100_000.0, 90_000.0, 70.0, vec!["DST"]);
        src.active = false;
        let facilities = vec![src, facility("DST", 100_000.0, 10_000.0, 70.0, vec![])];
        assert!(propose_transfers(date, &facilities).is_empty());
    }

    #[test]
    fn facilities_are_iterated_in_stable_code_order_regardless_of_input_order() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 15).unwrap();
        let facilities = vec![
            facility("Z-SRC", 100_000.0, 80_000.0, 70.0, vec!["A-DST"]),
            facility("A-DST", 100_000.0, 10_000.0, 70.0, vec![]),
        ];
        let proposals = propose_transfers(date, &facilities);
        assert_eq!(proposals.len(), 1);
        assert_eq!(proposals[0].source_code, "Z-SRC");
    }
}

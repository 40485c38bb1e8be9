use chrono::NaiveDate;

use super::{JobIndex, JobIndexEntry};

/// Fold freshly scanned entries into the persisted index.
///
/// - `existing` is kept as-is, in its order; new job numbers are appended.
/// - A known job takes the later digitize date (the existing one wins ties)
///   and the union of install dates, with dates before `today` dropped from
///   both sides.
/// - A new job keeps only its install dates on or after `today`.
///
/// Merging the same `scanned` set twice yields the same index as merging it once.
pub fn merge(existing: JobIndex, scanned: &[JobIndexEntry], today: NaiveDate) -> JobIndex {
    let mut merged = existing;

    for fresh in scanned {
        match merged.get_mut(&fresh.job_number) {
            Some(known) => {
                if let Some(date) = fresh.digitize_date {
                    if known.digitize_date.is_none_or(|current| date > current) {
                        known.digitize_date = Some(date);
                    }
                }
                known.install_dates.extend(fresh.install_dates.iter().copied());
                known.retain_from(today);
            }
            None => {
                let mut entry = fresh.clone();
                entry.retain_from(today);
                merged.upsert(entry);
            }
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn entry(job: &str, installs: &[NaiveDate]) -> JobIndexEntry {
        let mut e = JobIndexEntry::new(job);
        e.install_dates.extend(installs.iter().copied());
        e
    }

    #[test]
    fn past_dates_drop_from_both_sides() {
        let existing: JobIndex = [entry("100", &[d(2024, 1, 1), d(2024, 6, 1)])]
            .into_iter()
            .collect();
        let scanned = vec![entry("100", &[d(2024, 5, 1)])];

        let merged = merge(existing, &scanned, d(2024, 5, 15));

        let dates: Vec<_> = merged.get("100").unwrap().install_dates.iter().copied().collect();
        assert_eq!(dates, vec![d(2024, 6, 1)]);
        assert_eq!(merged.get("100").unwrap().formatted_install_dates(), "06/01/2024");
    }

    #[test]
    fn today_counts_as_future() {
        let today = d(2024, 5, 15);
        let merged = merge(JobIndex::new(), &[entry("7", &[today])], today);
        assert!(merged.get("7").unwrap().install_dates.contains(&today));
    }

    #[test]
    fn later_digitize_date_wins() {
        let mut known = entry("100", &[]);
        known.digitize_date = Some(d(2024, 4, 1));
        let existing: JobIndex = [known].into_iter().collect();

        let mut newer = entry("100", &[]);
        newer.digitize_date = Some(d(2024, 4, 20));
        let merged = merge(existing.clone(), &[newer], d(2024, 5, 1));
        assert_eq!(merged.get("100").unwrap().digitize_date, Some(d(2024, 4, 20)));

        let mut older = entry("100", &[]);
        older.digitize_date = Some(d(2024, 3, 1));
        let merged = merge(existing.clone(), &[older], d(2024, 5, 1));
        assert_eq!(merged.get("100").unwrap().digitize_date, Some(d(2024, 4, 1)));

        let merged = merge(existing, &[entry("100", &[])], d(2024, 5, 1));
        assert_eq!(merged.get("100").unwrap().digitize_date, Some(d(2024, 4, 1)));
    }

    #[test]
    fn known_job_keeps_its_name_and_shop_number() {
        let mut known = entry("100", &[]);
        known.job_name = "Original".into();
        known.shop_number = "24-1001".into();
        let mut fresh = entry("100", &[]);
        fresh.job_name = "Renamed".into();

        let merged = merge([known].into_iter().collect(), &[fresh], d(2024, 5, 1));
        let e = merged.get("100").unwrap();
        assert_eq!(e.job_name, "Original");
        assert_eq!(e.shop_number, "24-1001");
    }

    #[test]
    fn order_is_existing_then_new() {
        let existing: JobIndex = [entry("300", &[]), entry("100", &[])].into_iter().collect();
        let scanned = vec![entry("200", &[]), entry("100", &[]), entry("050", &[])];

        let merged = merge(existing, &scanned, d(2024, 5, 1));
        let order: Vec<_> = merged.iter().map(|e| e.job_number.as_str()).collect();
        assert_eq!(order, vec!["300", "100", "200", "050"]);
    }

    #[test]
    fn untouched_entries_are_not_filtered() {
        let existing: JobIndex = [entry("1", &[d(2023, 1, 1)])].into_iter().collect();
        let merged = merge(existing.clone(), &[], d(2024, 5, 1));
        assert_eq!(merged, existing);
    }

    #[test]
    fn merge_is_idempotent() {
        let today = d(2024, 5, 15);
        let mut known = entry("100", &[d(2024, 1, 1), d(2024, 6, 1)]);
        known.digitize_date = Some(d(2024, 2, 1));
        let existing: JobIndex = [known, entry("200", &[d(2024, 5, 20)])].into_iter().collect();

        let mut a = entry("100", &[d(2024, 5, 1), d(2024, 7, 4), d(2024, 6, 1)]);
        a.digitize_date = Some(d(2024, 3, 1));
        let scanned = vec![a, entry("300", &[d(2024, 4, 1), d(2024, 5, 30)])];

        let once = merge(existing, &scanned, today);
        let twice = merge(once.clone(), &scanned, today);
        assert_eq!(once, twice);
    }
}

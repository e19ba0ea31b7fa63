use crate::kaltura::types::FlavorAsset;

/// Deletion plan for one entry's flavors.
#[derive(Debug)]
pub struct FlavorPlan {
    pub keeper: FlavorAsset,
    pub keep_reason: &'static str,
    /// Kept because their flavorParamsId is on the configured keep-list.
    pub extra_kept: Vec<FlavorAsset>,
    pub to_delete: Vec<FlavorAsset>,
    pub bytes_freed: i64,
}

#[derive(Debug)]
pub enum PlanOutcome {
    /// One flavor or none; nothing to clean up.
    SingleFlavor,
    /// No original, no source tag, and no usable sizes to break the tie.
    NoKeeper,
    Plan(FlavorPlan),
}

/// Pick the flavor to keep and plan deletion of the rest.
///
/// Keeper priority: the original upload, else a flavor tagged `source`, else
/// the largest by byte size. Flavors whose `flavorParamsId` is on
/// `keep_params` survive regardless. The keeper is never on the delete list,
/// so an entry always retains at least one flavor.
pub fn plan_entry(flavors: &[FlavorAsset], keep_params: &[i64]) -> PlanOutcome {
    if flavors.len() <= 1 {
        return PlanOutcome::SingleFlavor;
    }
    let Some((keeper, keep_reason)) = pick_keeper(flavors) else {
        return PlanOutcome::NoKeeper;
    };

    let mut extra_kept = Vec::new();
    let mut to_delete = Vec::new();
    let mut bytes_freed = 0i64;
    for f in flavors {
        if f.id == keeper.id {
            continue;
        }
        if keep_params.contains(&f.flavor_params_id) {
            extra_kept.push(f.clone());
        } else {
            bytes_freed += f.size;
            to_delete.push(f.clone());
        }
    }
    PlanOutcome::Plan(FlavorPlan { keeper: keeper.clone(), keep_reason, extra_kept, to_delete, bytes_freed })
}

fn pick_keeper(flavors: &[FlavorAsset]) -> Option<(&FlavorAsset, &'static str)> {
    if let Some(f) = flavors.iter().find(|f| f.is_original) {
        return Some((f, "isOriginal"));
    }
    if let Some(f) = flavors.iter().find(|f| has_source_tag(&f.tags)) {
        return Some((f, "tags:source"));
    }
    flavors
        .iter()
        .filter(|f| f.size > 0)
        .max_by_key(|f| f.size)
        .map(|f| (f, "largest"))
}

fn has_source_tag(tags: &str) -> bool {
    tags.split(',').any(|t| t.trim().eq_ignore_ascii_case("source"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flavor(id: &str, params: i64, size: i64, tags: &str, original: bool) -> FlavorAsset {
        FlavorAsset {
            id: id.to_string(),
            entry_id: "1_e".to_string(),
            flavor_params_id: params,
            size,
            tags: tags.to_string(),
            is_original: original,
            file_ext: Some("mp4".to_string()),
        }
    }

    #[test]
    fn original_wins_over_source_tag_and_size() {
        let flavors = vec![
            flavor("f1", 0, 100, "source", false),
            flavor("f2", 1, 900_000, "web", false),
            flavor("f3", 2, 50, "", true),
        ];
        let PlanOutcome::Plan(plan) = plan_entry(&flavors, &[]) else { panic!("expected plan") };
        assert_eq!(plan.keeper.id, "f3");
        assert_eq!(plan.keep_reason, "isOriginal");
        assert_eq!(plan.to_delete.len(), 2);
    }

    #[test]
    fn source_tag_wins_over_size() {
        let flavors = vec![
            flavor("f1", 0, 100, "web, SOURCE", false),
            flavor("f2", 1, 900_000, "web", false),
        ];
        let PlanOutcome::Plan(plan) = plan_entry(&flavors, &[]) else { panic!("expected plan") };
        assert_eq!(plan.keeper.id, "f1");
        assert_eq!(plan.keep_reason, "tags:source");
    }

    #[test]
    fn largest_is_the_last_resort() {
        let flavors = vec![
            flavor("f1", 0, 100, "web", false),
            flavor("f2", 1, 900_000, "mobile", false),
            flavor("f3", 2, 500, "", false),
        ];
        let PlanOutcome::Plan(plan) = plan_entry(&flavors, &[]) else { panic!("expected plan") };
        assert_eq!(plan.keeper.id, "f2");
        assert_eq!(plan.keep_reason, "largest");
        assert_eq!(plan.bytes_freed, 600);
    }

    #[test]
    fn resourced_tag_does_not_match_source() {
        assert!(!has_source_tag("resourced,web"));
        assert!(has_source_tag("web , source"));
    }

    #[test]
    fn sole_flavor_is_never_deleted() {
        let flavors = vec![flavor("f1", 0, 100, "", false)];
        assert!(matches!(plan_entry(&flavors, &[]), PlanOutcome::SingleFlavor));
        assert!(matches!(plan_entry(&[], &[]), PlanOutcome::SingleFlavor));
    }

    #[test]
    fn unknown_sizes_yield_no_keeper() {
        let flavors = vec![
            flavor("f1", 0, 0, "web", false),
            flavor("f2", 1, 0, "mobile", false),
        ];
        assert!(matches!(plan_entry(&flavors, &[]), PlanOutcome::NoKeeper));
    }

    #[test]
    fn keep_list_spares_flavors_without_touching_the_keeper() {
        let flavors = vec![
            flavor("f1", 0, 100, "", true),
            flavor("f2", 487051, 300, "mobile", false),
            flavor("f3", 7, 500, "web", false),
        ];
        let PlanOutcome::Plan(plan) = plan_entry(&flavors, &[487051]) else { panic!("expected plan") };
        assert_eq!(plan.keeper.id, "f1");
        assert_eq!(plan.extra_kept.len(), 1);
        assert_eq!(plan.extra_kept[0].id, "f2");
        assert_eq!(plan.to_delete.len(), 1);
        assert_eq!(plan.to_delete[0].id, "f3");
        assert_eq!(plan.bytes_freed, 500);
    }

    #[test]
    fn exactly_one_keeper_per_entry() {
        let flavors = vec![
            flavor("f1", 0, 100, "source", true),
            flavor("f2", 1, 200, "source", false),
        ];
        let PlanOutcome::Plan(plan) = plan_entry(&flavors, &[]) else { panic!("expected plan") };
        let planned: Vec<&str> = plan.to_delete.iter().map(|f| f.id.as_str()).collect();
        assert!(!planned.contains(&plan.keeper.id.as_str()));
        assert_eq!(planned.len() + 1, flavors.len());
    }
}

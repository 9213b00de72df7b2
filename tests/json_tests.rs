use pursuit::{run_scenario_dir, PathScenario};
use std::fs;

#[test]
fn json_scenario_tests() {
    let test_dir = "./test_data";
    let mut passed = 0;

    let mut entries: Vec<_> = fs::read_dir(test_dir)
        .expect("test_data directory")
        .filter_map(Result::ok)
        .collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }

        let scenario = PathScenario::load(&path).expect("valid scenario");
        let mut costs = Vec::new();
        for variant in scenario.variants() {
            let report = variant.run().expect("scenario runs");
            assert!(
                report.passed,
                "Scenario '{}' failed: {}",
                report.name,
                report.mismatch.unwrap_or_default()
            );
            costs.push(report.cost);
        }

        // Mirroring never changes the optimal cost
        assert!(costs.windows(2).all(|w| w[0] == w[1]), "{}: {:?}", scenario.test_name, costs);
        passed += 1;
    }

    assert!(passed > 0, "no scenarios found in {test_dir}");
    println!("All {} JSON scenarios passed (4 variants each)", passed);
}

#[test]
fn scenario_dir_reports_in_name_order() {
    let reports = run_scenario_dir("./test_data").expect("scenarios load");
    let names: Vec<_> = reports.iter().map(|r| r.name.clone()).collect();

    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);
    assert!(reports.iter().all(|r| r.passed));
}

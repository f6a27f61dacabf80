use rbperf_core::catalog::ObjectId;
use rbperf_core::record::TABLE_COLUMNS;
use rbperf_core::{Decomposition, Metric, ResultRecord, TimingTriple, TrialRequest};

#[test]
fn full_plan_covers_every_object_in_every_region() {
    let plan = TrialRequest::full_plan();
    assert_eq!(plan.len(), ObjectId::ALL.len() * 11);

    for object in ObjectId::ALL {
        assert_eq!(plan.iter().filter(|r| r.object == object).count(), 11);
    }
    let buckets: std::collections::HashSet<String> =
        plan.iter().map(TrialRequest::bucket_name).collect();
    assert_eq!(buckets.len(), 11);
}

#[test]
fn measured_trial_renders_a_full_row() {
    let request = TrialRequest::parse("64mib.txt", "us-west2").unwrap();
    let triple = TimingTriple::new(
        Metric::Measured(4000.0),
        Metric::Measured(5000.0),
        Metric::Measured(3800.0),
    );
    let d = Decomposition::compute(
        &triple,
        request.object.size_bytes(),
        request.object.size_mib(),
    );
    let record = ResultRecord::assemble(&request, &d);

    assert_eq!(record.time_taken_server_network_hop, "1200.000");
    assert_eq!(record.percent_change, 25);
    assert_eq!(record.speed_mib_per_sec, "16.000");
    assert_eq!(record.file_size_bytes, "67108864");

    let cells = record.table_cells();
    assert_eq!(cells.len(), TABLE_COLUMNS.len());
    assert_eq!(
        cells,
        vec![
            "gcsrbpa-us-west2",
            "Los Angeles",
            "64mib.txt",
            "16.000",
            "4000.000",
            "5000.000",
            "3800.000",
            "1200.000",
            "25",
        ]
    );
}

#[test]
fn failed_latency_only_affects_upstream_fields() {
    let request = TrialRequest::parse("2mib.txt", "us-south1").unwrap();
    let triple = TimingTriple::new(Metric::Measured(1000.0), Metric::Measured(750.0), Metric::Failed);
    let d = Decomposition::compute(&triple, request.object.size_bytes(), request.object.size_mib());
    let record = ResultRecord::assemble(&request, &d);

    assert_eq!(record.time_taken_client, "1000.000");
    assert_eq!(record.time_taken_server_client_upstream, "-1.000");
    assert_eq!(record.time_taken_server_network_hop, "-1.000");
    assert_eq!(record.percent_change, -25);
    assert_eq!(record.speed_mib_per_sec, "2.000");
}

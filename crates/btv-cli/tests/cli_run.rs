use std::path::PathBuf;
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

use arrow::array::AsArray;
use arrow::datatypes::Int32Type;

fn bin_path() -> PathBuf {
    PathBuf::from(env!("CARGO_BIN_EXE_fastbtv"))
}

fn repo_root() -> PathBuf {
    // crates/btv-cli -> repo root
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../..").canonicalize().unwrap()
}

fn fixture_path(name: &str) -> PathBuf {
    repo_root().join("tests/fixtures").join(name)
}

fn tmp_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_nanos();
    let mut p = std::env::temp_dir();
    p.push(format!("fastbtv_cli_{}_{}_{}", std::process::id(), nanos, name));
    p
}

fn run(args: &[&str]) -> Output {
    Command::new(bin_path())
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("failed to run {:?} {:?}: {}", bin_path(), args, e))
}

fn run_fixture(out_dir: &PathBuf, extra: &[&str]) -> serde_json::Value {
    let cfg = fixture_path("btv_config.yaml");
    let events = fixture_path("events.jsonl");
    assert!(cfg.exists(), "missing fixture: {}", cfg.display());
    assert!(events.exists(), "missing fixture: {}", events.display());

    let mut args = vec![
        "run".to_string(),
        "--config".to_string(),
        cfg.to_string_lossy().into_owned(),
        "--input".to_string(),
        events.to_string_lossy().into_owned(),
        "--out-dir".to_string(),
        out_dir.to_string_lossy().into_owned(),
    ];
    args.extend(extra.iter().map(|s| s.to_string()));
    let args: Vec<&str> = args.iter().map(String::as_str).collect();

    let out = run(&args);
    assert!(
        out.status.success(),
        "run should succeed, stderr={}",
        String::from_utf8_lossy(&out.stderr)
    );
    serde_json::from_slice(&out.stdout).expect("run summary should be JSON")
}

#[test]
fn run_writes_one_row_per_jet() {
    let out_dir = tmp_dir("run_rows");
    let summary = run_fixture(&out_dir, &[]);

    assert_eq!(summary["events"], 4);
    assert_eq!(summary["jets"], 7);
    assert_eq!(summary["rows"], 7);
    assert_eq!(summary["selected_jets"], 4);
    // 4 selected jets x 3 alias groups x 3 axes.
    assert_eq!(summary["fills"], 36);
    assert_eq!(summary["histograms"], 27);

    let batches = btv_io::read_parquet_batches(&out_dir.join("tree.parquet")).unwrap();
    let n: usize = batches.iter().map(|b| b.num_rows()).sum();
    assert_eq!(n, 7);

    let schema = batches[0].schema();
    let names: Vec<&str> = schema.fields().iter().map(|f| f.name().as_str()).collect();
    assert_eq!(
        names,
        [
            "run", "lumi", "evt", "flavour", "jet_pt", "jet_eta", "jet_phi", "pu", "CSVv2",
            "DeepCSV", "DeepFlavour"
        ]
    );

    let mut flavour = Vec::new();
    let mut pu = Vec::new();
    for b in &batches {
        flavour.extend(b.column(3).as_primitive::<Int32Type>().values().iter().copied());
        pu.extend(b.column(7).as_primitive::<Int32Type>().values().iter().copied());
    }
    assert_eq!(flavour, [5, 0, 4, 21, 5, 4, 5]);
    // Event 1002 has no in-time crossing and keeps the previous value.
    assert_eq!(pu, [55, 55, 55, 55, 55, 70, 70]);

    let _ = std::fs::remove_dir_all(&out_dir);
}

#[test]
fn histograms_are_deterministic() {
    let out_a = tmp_dir("hists_a");
    let out_b = tmp_dir("hists_b");
    run_fixture(&out_a, &[]);
    run_fixture(&out_b, &[]);

    let a = std::fs::read(out_a.join("histograms.json")).unwrap();
    let b = std::fs::read(out_b.join("histograms.json")).unwrap();
    assert_eq!(a, b, "histograms.json should be byte-identical across runs");

    let hists = btv_io::read_histograms(&out_a.join("histograms.json")).unwrap();
    assert_eq!(hists.len(), 27);
    assert_eq!(hists[0].name(), "pfCombinedInclusiveSecondaryVertexV2BJetTags_b_pt");
    let df_b_pt = hists.iter().find(|h| h.name() == "pfDeepFlavourJetTagsProbB_b_pt").unwrap();
    assert_eq!(df_b_pt.entries(), 2);

    let _ = std::fs::remove_dir_all(&out_a);
    let _ = std::fs::remove_dir_all(&out_b);
}

#[test]
fn max_events_limits_the_stream() {
    let out_dir = tmp_dir("max_events");
    let summary = run_fixture(&out_dir, &["--max-events", "2"]);
    assert_eq!(summary["events"], 2);
    assert_eq!(summary["rows"], 5);
    let _ = std::fs::remove_dir_all(&out_dir);
}

#[test]
fn groups_reports_resolved_groups() {
    let cfg = fixture_path("btv_config.yaml");
    let out = run(&["groups", "--config", cfg.to_string_lossy().as_ref()]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();

    let groups: Vec<&str> = v["alias_groups"]
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        groups,
        [
            "pfCombinedInclusiveSecondaryVertexV2BJetTags",
            "pfDeepCSVJetTagsProbB",
            "pfDeepFlavourJetTagsProbB"
        ]
    );
    assert_eq!(v["alias_groups"][2]["rule"], "DEEPFLAVOUR_SUM");
    assert_eq!(v["alias_groups"][2]["members"].as_array().unwrap().len(), 3);
    assert_eq!(v["columns"], serde_json::json!(["CSVv2", "DeepCSV", "DeepFlavour"]));
    assert_eq!(v["histograms"].as_array().unwrap().len(), 27);
}

#[test]
fn efficiency_from_run_output() {
    let out_dir = tmp_dir("efficiency");
    run_fixture(&out_dir, &[]);
    let hists = out_dir.join("histograms.json");
    let result = out_dir.join("eff.json");

    let out = run(&[
        "efficiency",
        "--histograms",
        hists.to_string_lossy().as_ref(),
        "--group",
        "pfDeepFlavourJetTagsProbB",
        "--axis",
        "pt",
        "--op",
        "loose=0.0494",
        "--op",
        "medium=0.2770",
        "--output",
        result.to_string_lossy().as_ref(),
    ]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));

    let v: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&result).unwrap()).unwrap();
    let curves = v["curves"].as_array().unwrap();
    assert_eq!(curves.len(), 6);

    // b jets: pt 45.2 (score 0.9) and pt 78.9 (score 0.03), 10 GeV bins.
    let loose_b = &curves[0];
    assert_eq!(loose_b["category"], "b");
    assert_eq!(loose_b["operating_point"], "loose");
    assert_eq!(loose_b["bin_edges"].as_array().unwrap().len(), 101);
    assert_eq!(loose_b["efficiency"][4], 1.0);
    assert_eq!(loose_b["efficiency"][7], 0.0);
    assert!(loose_b["efficiency"][0].is_null());

    let _ = std::fs::remove_dir_all(&out_dir);
}

#[test]
fn missing_jet_collection_fails() {
    let out_dir = tmp_dir("missing_label");
    std::fs::create_dir_all(&out_dir).unwrap();
    let cfg = out_dir.join("cfg.yaml");
    std::fs::write(
        &cfg,
        "jets: slimmedJetsAK8\npuInfo: slimmedAddPileupInfo\nbDiscriminators_hist: [x]\n",
    )
    .unwrap();
    let events = fixture_path("events.jsonl");

    let out = run(&[
        "run",
        "--config",
        cfg.to_string_lossy().as_ref(),
        "--input",
        events.to_string_lossy().as_ref(),
        "--out-dir",
        out_dir.to_string_lossy().as_ref(),
    ]);
    assert!(!out.status.success(), "run should fail on an unknown collection label");
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("slimmedJetsAK8"), "stderr={stderr}");

    let _ = std::fs::remove_dir_all(&out_dir);
}

#[test]
fn roc_from_run_output() {
    let out_dir = tmp_dir("roc");
    run_fixture(&out_dir, &[]);
    let tree = out_dir.join("tree.parquet");
    let tree = tree.to_string_lossy();
    let roc_args = |extra: &[&str]| {
        let mut args = vec!["roc", "--tree", tree.as_ref(), "--column", "DeepFlavour"];
        args.extend_from_slice(extra);
        run(&args)
    };

    // Jets at pt 18..121 with |eta| <= 2.5: b at 45.2, 78.9, 20.0; light at 18.0;
    // c at 120.5 and 25.0. The gluon at eta 2.6 is outside.
    let out = roc_args(&["--pt-min", "10"]);
    assert!(out.status.success(), "stderr={}", String::from_utf8_lossy(&out.stderr));
    let v: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(v["column"], "DeepFlavour");
    let curves = v["curves"].as_array().unwrap();
    assert_eq!(curves.len(), 2);

    let bvsl = &curves[0];
    assert_eq!(bvsl["label"], "BvsL");
    assert_eq!(bvsl["background"], "light");
    assert_eq!(bvsl["n_signal"], 3);
    assert_eq!(bvsl["n_background"], 1);
    let points = bvsl["points"].as_array().unwrap();
    assert_eq!(points[0]["mistag"], 0.0);
    // The b jet at 0.03 sits below the light jet at 0.04.
    let last = points.last().unwrap();
    assert_eq!(last["efficiency"], 1.0);
    assert_eq!(last["mistag"], 1.0);
    assert!(bvsl["band"].is_null());

    assert_eq!(curves[1]["label"], "BvsC");
    assert_eq!(curves[1]["n_background"], 2);

    // The bootstrap band is reproducible for a fixed seed.
    let band_args = ["--pt-min", "10", "--vs", "c", "--bootstrap", "30", "--seed", "7"];
    let a = roc_args(&band_args);
    let b = roc_args(&band_args);
    assert!(a.status.success(), "stderr={}", String::from_utf8_lossy(&a.stderr));
    assert_eq!(a.stdout, b.stdout);
    let v: serde_json::Value = serde_json::from_slice(&a.stdout).unwrap();
    assert_eq!(v["curves"].as_array().unwrap().len(), 1);
    assert_eq!(v["curves"][0]["band"]["mistag"].as_array().unwrap().len(), 80);

    // Default selection (pt > 100) keeps only the c jet at 120.5.
    let out = roc_args(&[]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("BvsL") && stderr.contains("both classes"), "stderr={stderr}");

    let _ = std::fs::remove_dir_all(&out_dir);
}

use std::{error::Error, fs, path::Path};

use approx::assert_abs_diff_eq;
use ndarray::array;

use blade_design::{
    config::RunConfig,
    design::{run_design, write_design},
    fields::fields,
    htc::{ae_reference, TwistTableLayout},
    interpolate::IsMonotonic,
    reader::{read_geometry, GeometryLayout},
    simulation::{DesignFiles, SimulationAdapter, SimulationOutputs},
    writer::write_geometry,
    BladeError, BladeGeometry, Modifier, ModifierStack, SimulationError,
};

const AE: &str = "tests/fixtures/reference_ae.dat";
const HTC: &str = "tests/fixtures/reference.htc";

fn layout() -> GeometryLayout {
    GeometryLayout {
        ae_header_lines: 2,
        expected_sections: Some(6),
        htc_lines: None,
        twist: TwistTableLayout {
            start_line: 7,
            rows: 4,
            ..Default::default()
        },
    }
}

fn reference() -> Result<BladeGeometry, Box<dyn Error>> {
    Ok(read_geometry(Path::new(AE), Path::new(HTC), &layout())?)
}

/// copies of both fixtures in a fresh directory
fn working_copies(dir: &Path) -> Result<(std::path::PathBuf, std::path::PathBuf), Box<dyn Error>> {
    let ae = dir.join("work_ae.dat");
    let htc = dir.join("work.htc");
    fs::copy(AE, &ae)?;
    fs::copy(HTC, &htc)?;
    Ok((ae, htc))
}

#[test]
fn test_read_reference_blade() -> Result<(), Box<dyn Error>> {
    let geo = reference()?;
    assert_eq!(geo.len(), 6);
    assert!(geo.radius().is_strict_rising());
    assert_eq!(geo.max_radius(), 80.0);
    assert_abs_diff_eq!(
        geo.twist().to_owned(),
        array![-14.5, -12.25, -10.0, -6.0, -2.0, -3.0],
        epsilon = 1e-12
    );
    assert_abs_diff_eq!(
        geo.chord().to_owned(),
        array![5.38, 5.45, 5.87, 6.2, 4.5, 0.6],
        epsilon = 1e-12
    );
    assert_eq!(geo.rel_thickness()[1], 98.0);
    Ok(())
}

#[test]
fn test_read_rejects_wrong_section_count() {
    let layout = GeometryLayout {
        expected_sections: Some(27),
        ..layout()
    };
    let err = read_geometry(Path::new(AE), Path::new(HTC), &layout).unwrap_err();
    assert!(matches!(err, BladeError::MalformedInput { .. }));
}

#[test]
fn test_read_rejects_misplaced_twist_table() {
    let layout = GeometryLayout {
        twist: TwistTableLayout {
            start_line: 6,
            rows: 4,
            ..Default::default()
        },
        ..layout()
    };
    // `nsec 4;` has too few fields
    let err = read_geometry(Path::new(AE), Path::new(HTC), &layout).unwrap_err();
    match err {
        BladeError::MalformedInput { line, .. } => assert_eq!(line, 7),
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn test_round_trip_without_modifiers() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let (ae, htc) = working_copies(dir.path())?;
    let baseline = reference()?;
    let unchanged = ModifierStack::new().apply(&baseline)?;

    write_geometry(&unchanged, &ae, &htc, &layout(), "./data/reference_ae.dat")?;

    assert_eq!(fs::read_to_string(&ae)?, fs::read_to_string(AE)?);

    let original = fs::read_to_string(HTC)?;
    let written = fs::read_to_string(&htc)?;
    let table = 7..11;
    for (idx, (a, b)) in original.lines().zip(written.lines()).enumerate() {
        if table.contains(&idx) {
            let (fa, fb) = (fields(a), fields(b));
            assert_eq!(&a[..fa[5].span.start], &b[..fb[5].span.start]);
            assert_eq!(&a[fa[5].span.end..], &b[fb[5].span.end..]);
            assert_abs_diff_eq!(fa[5].parse().unwrap(), fb[5].parse().unwrap(), epsilon = 1e-9);
        } else {
            assert_eq!(a, b);
        }
    }
    assert_eq!(original.lines().count(), written.lines().count());

    let reread = read_geometry(&ae, &htc, &layout())?;
    assert_abs_diff_eq!(reread.geo_matrix(), baseline.geo_matrix(), epsilon = 1e-9);
    Ok(())
}

#[test]
fn test_modified_design_written_and_reread() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let (ae, htc) = working_copies(dir.path())?;
    let baseline = reference()?;

    let mut stack = ModifierStack::new();
    stack
        .push(Modifier::linear_root_chord(-1.0, 0.25))
        .push(Modifier::manual_root_twist(-2.0, 0.25, vec![1.0, 0.5, 0.25]))
        .push(Modifier::cylindrical_root(0.25));
    let design = stack.apply(&baseline)?;

    write_geometry(&design, &ae, &htc, &layout(), "./data/WDR_ae.dat")?;

    let reread = read_geometry(&ae, &htc, &layout())?;
    assert_eq!(reread.len(), baseline.len());
    // r/R = 0, 0.125 and 0.25 are selected, the boundary is inclusive
    assert_abs_diff_eq!(
        reread.chord().to_owned(),
        array![4.38, 4.575, 5.12, 6.2, 4.5, 0.6],
        epsilon = 1e-9
    );
    assert_abs_diff_eq!(
        reread.rel_thickness().to_owned(),
        array![100.0, 100.0, 100.0, 41.3, 27.0, 24.1],
        epsilon = 1e-9
    );
    // twist survives the trip through the coarser twist table at its knots
    assert_abs_diff_eq!(reread.twist()[0], -16.5, epsilon = 1e-9);
    assert_abs_diff_eq!(reread.twist()[2], -10.5, epsilon = 1e-9);
    assert_abs_diff_eq!(reread.twist()[4], -2.0, epsilon = 1e-9);
    assert_eq!(
        ae_reference(&fs::read_to_string(&htc)?),
        Some("./data/WDR_ae.dat")
    );
    Ok(())
}

#[test]
fn test_three_section_scenario() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let ae = dir.path().join("s_ae.dat");
    let htc = dir.path().join("s.htc");
    fs::write(&ae, "1\n1 3\n0 5 30 1 ;\n50 4 30 1 ;\n100 3 30 1 ;\n")?;
    fs::write(
        &htc,
        "\tae_filename ./data/s_ae.dat;\n\t\tsec 1 0 0 0 10.0;\n\t\tsec 2 0 0 100 0.0;\n",
    )?;
    let layout = GeometryLayout {
        twist: TwistTableLayout {
            start_line: 1,
            rows: 2,
            ..Default::default()
        },
        ..Default::default()
    };

    let baseline = read_geometry(&ae, &htc, &layout)?;
    assert_abs_diff_eq!(baseline.normalized_radius(), array![0.0, 0.5, 1.0]);
    assert_abs_diff_eq!(baseline.twist().to_owned(), array![10.0, 5.0, 0.0], epsilon = 1e-12);

    let design = Modifier::linear_root_chord(-1.0, 0.5).apply(&baseline)?;
    assert_abs_diff_eq!(design.chord().to_owned(), array![4.0, 3.5, 3.0], epsilon = 1e-12);

    write_geometry(&design, &ae, &htc, &layout, "./data/s2_ae.dat")?;
    assert_eq!(
        fs::read_to_string(&ae)?,
        "1\n1 3\n0 4 30 1 ;\n50 3.5 30 1 ;\n100 3 30 1 ;\n"
    );
    Ok(())
}

#[test]
fn test_failed_write_leaves_copies_untouched() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let (ae, htc) = working_copies(dir.path())?;
    let baseline = reference()?;

    // the working copy lost a table row since it was read
    let broken: String = fs::read_to_string(&htc)?
        .lines()
        .filter(|l| !l.contains("sec\t3"))
        .map(|l| format!("{l}\n"))
        .collect();
    fs::write(&htc, &broken)?;

    let design = Modifier::cosine_chord(0.5).apply(&baseline)?;
    let err = write_geometry(&design, &ae, &htc, &layout(), "./data/x_ae.dat").unwrap_err();
    assert!(matches!(err, BladeError::FormatMismatch { .. }));
    assert_eq!(fs::read_to_string(&ae)?, fs::read_to_string(AE)?);
    assert_eq!(fs::read_to_string(&htc)?, broken);
    Ok(())
}

#[test]
fn test_write_to_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let baseline = reference().unwrap();
    let err = write_geometry(
        &baseline,
        &dir.path().join("missing_ae.dat"),
        Path::new(HTC),
        &layout(),
        "x",
    )
    .unwrap_err();
    assert!(matches!(err, BladeError::Io { .. }));
}

struct FakeSolver {
    fail: bool,
}

impl SimulationAdapter for FakeSolver {
    fn run(&self, design: &DesignFiles) -> blade_design::Result<SimulationOutputs> {
        assert!(design.htc_path.is_file());
        assert!(design.ae_path.is_file());
        if self.fail {
            return Err(SimulationError::Failed {
                design: design.name.clone(),
                status: "exit status: 1".into(),
            }
            .into());
        }
        Ok(SimulationOutputs {
            design: design.name.clone(),
            files: vec![design.htc_path.with_extension("pwr")],
        })
    }
}

fn run_config(dir: &Path) -> Result<RunConfig, Box<dyn Error>> {
    let base = dir.join("base");
    fs::create_dir_all(base.join("data"))?;
    fs::copy(AE, base.join("data/reference_ae.dat"))?;
    fs::copy(HTC, base.join("reference.htc"))?;
    let toml = format!(
        r#"
design_name = "WDR"

[baseline]
ae_file = '{base}/data/reference_ae.dat'
htc_file = '{base}/reference.htc'

[layout]
expected_sections = 6
[layout.twist]
start_line = 7
rows = 4

[output]
directory = '{out}'

[[modifier]]
kind = "linear_root_chord"
amount = -1.0
threshold = 0.25

[[modifier]]
kind = "tip_cosine_chord"
enabled = false
amount = -0.5
threshold = 0.6
"#,
        base = base.display(),
        out = dir.join("out").display()
    );
    Ok(RunConfig::from_toml(&toml)?)
}

#[test]
fn test_run_design_end_to_end() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let config = run_config(dir.path())?;

    let outcome = run_design(&config, &FakeSolver { fail: false })?;

    let out = dir.path().join("out");
    assert_eq!(outcome.written.files.htc_path, out.join("WDR.htc"));
    assert!(out.join("data/WDR_ae.dat").is_file());
    assert!(out.join("WDR.geo").is_file());
    assert!(out.join("WDR_comparison.csv").is_file());
    assert_eq!(outcome.outputs.files.len(), 1);

    let htc = fs::read_to_string(out.join("WDR.htc"))?;
    assert!(htc.contains("\tae_filename ./data/WDR_ae.dat;\n"));

    // baseline files are never written
    assert_eq!(
        fs::read_to_string(dir.path().join("base/reference.htc"))?,
        fs::read_to_string(HTC)?
    );

    let saved = blade_design::bundle::load_geo(&out.join("WDR.geo"))?;
    assert_eq!(saved, outcome.written.geometry.design);
    assert_abs_diff_eq!(saved.chord()[0], 4.38, epsilon = 1e-12);
    assert_abs_diff_eq!(saved.chord()[5], 0.6, epsilon = 1e-12);
    Ok(())
}

#[test]
fn test_failed_simulation_is_reported() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let config = run_config(dir.path())?;

    let err = run_design(&config, &FakeSolver { fail: true }).unwrap_err();
    assert!(matches!(err, BladeError::Simulation(SimulationError::Failed { .. })));
    assert!(!dir.path().join("out/WDR.geo").exists());
    Ok(())
}

#[test]
fn test_write_design_refuses_to_overwrite_baseline() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let mut config = run_config(dir.path())?;
    config.design_name = "reference".into();
    config.output.directory = dir.path().join("base");
    config.output.ae_dir = "data".into();
    // design_ae_path would be base/data/reference_ae.dat
    let err = write_design(&config).unwrap_err();
    assert!(matches!(err, BladeError::Configuration(_)));
    Ok(())
}

#[test]
fn test_write_design_saves_comparison() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let config = run_config(dir.path())?;
    assert!(config.output.comparison);

    let written = write_design(&config)?;

    let out = dir.path().join("out");
    assert!(written.files.htc_path.is_file());
    assert!(written.files.ae_path.is_file());
    // the finalized geometry is only saved after a successful simulation
    assert!(!out.join("WDR.geo").exists());

    let comparison = fs::read_to_string(out.join("WDR_comparison.csv"))?;
    let lines: Vec<&str> = comparison.lines().collect();
    assert_eq!(lines.len(), 7);
    assert!(lines[0].starts_with("r_R\tchord_baseline\tchord_design"));
    let root: Vec<f64> = lines[1]
        .split('\t')
        .map(|f| f.parse::<f64>())
        .collect::<Result<_, _>>()?;
    assert_eq!(root.len(), 7);
    assert_abs_diff_eq!(root[1], 5.38, epsilon = 1e-12);
    assert_abs_diff_eq!(root[2], 4.38, epsilon = 1e-12);
    Ok(())
}

#[test]
fn test_write_design_removes_partial_copies() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let config = run_config(dir.path())?;
    let out = dir.path().join("out");
    fs::create_dir_all(&out)?;
    // a plain file where the element table directory should go
    fs::write(out.join("data"), "")?;

    let err = write_design(&config).unwrap_err();
    assert!(matches!(err, BladeError::Io { .. }));
    assert!(!out.join("WDR.htc").exists());
    Ok(())
}

#[test]
fn test_line_count_of_configuration_file_is_checked() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let (ae, htc) = working_copies(dir.path())?;
    let pinned = GeometryLayout {
        htc_lines: Some(20),
        ..layout()
    };
    let baseline = read_geometry(&ae, &htc, &pinned)?;

    // a line was added outside the twist table since the file was read
    let grown = format!("{}; comment\n", fs::read_to_string(&htc)?);
    fs::write(&htc, &grown)?;

    let err = write_geometry(&baseline, &ae, &htc, &pinned, "./data/x_ae.dat").unwrap_err();
    assert!(matches!(err, BladeError::FormatMismatch { .. }));
    assert_eq!(fs::read_to_string(&htc)?, grown);

    let err = read_geometry(&ae, &htc, &pinned).unwrap_err();
    assert!(matches!(err, BladeError::MalformedInput { .. }));
    Ok(())
}

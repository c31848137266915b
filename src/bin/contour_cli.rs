use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use contour_engine::contour::CatmullRomAlpha;
use contour_engine::{
    Boundary, ContourConfig, ContourEngine, ContourFrame, ExpressionField, Fill, InterpolationMode,
};

const SNAPSHOT_QUANTIZE: f64 = 1e-6;
const SNAPSHOT_DECIMALS: usize = 6;

const DEFAULT_GRID: usize = 41;

const USAGE: &str = r#"contour_cli (contour-engine)

USAGE:
  contour_cli list
  contour_cli run <scenario|all> [options]

SCENARIOS:
  paraboloid
  saddle
  ripple
  sqrt_edge
  twin_peaks

OPTIONS (run):
  --rows <n>          Grid rows (default 41)
  --cols <n>          Grid columns (default 41)
  --levels <a,b,..>   Override the scenario's ascending levels
  --mode <mode>       linear | cubic | catmull-rom | hermite | monotone
  --out <path>        Write the summary to a file (single scenario only)
  --overwrite         Overwrite an existing output file
  -h, --help          Show this help
"#;

fn main() {
    contour_engine::init_logger();
    if let Err(err) = run() {
        eprintln!("contour_cli error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mut args = Args::new(args);

    let Some(command) = args.next() else {
        print_usage();
        return Ok(());
    };

    match command.as_str() {
        "list" => {
            for scenario in Scenario::ALL {
                println!("{:<12} {}", scenario.name(), scenario.expression());
            }
            Ok(())
        }
        "run" => cmd_run(&mut args),
        "-h" | "--help" | "help" => {
            print_usage();
            Ok(())
        }
        other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
    }
}

fn print_usage() {
    println!("{USAGE}");
}

struct RunOptions {
    rows: usize,
    cols: usize,
    levels: Option<Vec<f64>>,
    mode: InterpolationMode,
}

fn cmd_run(args: &mut Args) -> Result<(), String> {
    let scenario_name = args.next().ok_or("missing scenario name")?;

    let mut options = RunOptions {
        rows: DEFAULT_GRID,
        cols: DEFAULT_GRID,
        levels: None,
        mode: InterpolationMode::Linear,
    };
    let mut out: Option<PathBuf> = None;
    let mut overwrite = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--rows" => options.rows = parse_count("--rows", &args.value("--rows")?)?,
            "--cols" => options.cols = parse_count("--cols", &args.value("--cols")?)?,
            "--levels" => options.levels = Some(parse_levels(&args.value("--levels")?)?),
            "--mode" => options.mode = parse_mode(&args.value("--mode")?)?,
            "--out" => out = Some(PathBuf::from(args.value("--out")?)),
            "--overwrite" => overwrite = true,
            "-h" | "--help" => {
                print_usage();
                return Ok(());
            }
            other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
        }
    }

    if scenario_name == "all" {
        if out.is_some() {
            return Err("--out takes a single scenario".to_string());
        }
        for scenario in Scenario::ALL {
            print!("{}", run_scenario(*scenario, &options)?);
        }
        return Ok(());
    }

    let scenario =
        Scenario::from_name(&scenario_name).ok_or_else(|| unknown_scenario(&scenario_name))?;
    let summary = run_scenario(scenario, &options)?;
    match out.as_deref() {
        Some(path) => {
            write_text_file(path, &summary, overwrite)?;
            eprintln!("wrote {}", path.display());
        }
        None => print!("{summary}"),
    }
    Ok(())
}

fn run_scenario(scenario: Scenario, options: &RunOptions) -> Result<String, String> {
    let field = ExpressionField::parse(scenario.expression()).map_err(|e| e.to_string())?;
    let levels = options
        .levels
        .clone()
        .unwrap_or_else(|| scenario.levels().to_vec());
    let config = ContourConfig::with_level_values(Boundary::new(0.0, 0.0, 10.0, 10.0), &levels)
        .with_interpolation(options.mode);

    let mut engine = ContourEngine::from_field(config, Box::new(field), options.rows, options.cols)
        .map_err(|e| format!("{}: {e}", scenario.name()))?;
    let frame = engine.frame();

    eprintln!("{}: {}", scenario.name(), frame.diagnostics.summary());
    Ok(summarize(scenario, options, &levels, frame))
}

fn summarize(scenario: Scenario, options: &RunOptions, levels: &[f64], frame: &ContourFrame) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "scenario {}", scenario.name());
    let _ = writeln!(out, "field {}", scenario.expression());
    let _ = writeln!(out, "grid {}x{}", options.rows, options.cols);
    let _ = writeln!(out, "mode {}", options.mode.name());
    let _ = write!(out, "levels");
    for &level in levels {
        out.push(' ');
        write_f64(&mut out, level);
    }
    out.push('\n');

    let _ = writeln!(out, "region_count {}", frame.regions.len());
    for (idx, region) in frame.regions.iter().enumerate() {
        let _ = write!(out, "region.{idx} area ");
        write_f64(&mut out, region.path.area());
        let _ = writeln!(
            out,
            " vertices {} holes {} levels {:?} fill {}",
            region.path.vertex_count(),
            region.path.holes.len(),
            region.path.levels,
            region.fill
        );
    }

    let _ = writeln!(out, "fill_count {}", frame.fills.len());
    for (idx, fill) in frame.fills.iter().enumerate() {
        let _ = write!(out, "fill.{idx} ");
        write_bound(&mut out, fill.first);
        out.push_str(" .. ");
        write_bound(&mut out, fill.second);
        match &fill.fill {
            Fill::Color(color) => {
                let [r, g, b, a] = color.components();
                let _ = writeln!(out, " rgba {r:.3} {g:.3} {b:.3} {a:.3}");
            }
            Fill::Image(image) => {
                let _ = writeln!(out, " image {}", image.name);
            }
            Fill::Empty => out.push_str(" empty\n"),
        }
    }

    let _ = writeln!(out, "line_count {}", frame.lines.len());
    let _ = writeln!(out, "label_count {}", frame.labels.len());
    let _ = writeln!(out, "cluster_count {}", frame.clusters.len());
    let _ = write!(out, "covered_area ");
    write_f64(&mut out, frame.covered_area());
    out.push('\n');
    let _ = writeln!(out, "diagnostics {}", frame.diagnostics.summary());
    for (idx, warning) in frame.diagnostics.warnings.iter().enumerate() {
        let _ = writeln!(out, "warning.{idx} {warning}");
    }
    out.push('\n');
    out
}

fn unknown_scenario(name: &str) -> String {
    let mut msg = format!("unknown scenario `{name}`\n\navailable scenarios:\n");
    for scenario in Scenario::ALL {
        let _ = writeln!(msg, "  {}", scenario.name());
    }
    msg
}

fn parse_count(flag: &str, value: &str) -> Result<usize, String> {
    match value.parse::<usize>() {
        Ok(n) if n >= 2 => Ok(n),
        _ => Err(format!("{flag} expects an integer >= 2, got `{value}`")),
    }
}

fn parse_levels(value: &str) -> Result<Vec<f64>, String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<f64>().map_err(|e| format!("bad level `{s}`: {e}")))
        .collect()
}

fn parse_mode(value: &str) -> Result<InterpolationMode, String> {
    match value {
        "linear" => Ok(InterpolationMode::Linear),
        "cubic" => Ok(InterpolationMode::CubicSpline),
        "catmull-rom" => Ok(InterpolationMode::CatmullRom(CatmullRomAlpha::Centripetal)),
        "hermite" => Ok(InterpolationMode::Hermite),
        "monotone" => Ok(InterpolationMode::MonotoneHermite),
        other => Err(format!("unknown interpolation mode `{other}`")),
    }
}

fn write_text_file(path: &Path, text: &str, overwrite: bool) -> Result<(), String> {
    if path.exists() && !overwrite {
        return Err(format!(
            "refusing to overwrite existing file {} (use --overwrite)",
            path.display()
        ));
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
    }
    fs::write(path, text).map_err(|e| format!("write {}: {e}", path.display()))
}

fn quantize_f64(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    let q = (value / SNAPSHOT_QUANTIZE).round() * SNAPSHOT_QUANTIZE;
    if q == 0.0 { 0.0 } else { q }
}

fn write_f64(out: &mut String, value: f64) {
    let value = quantize_f64(value);
    let _ = write!(out, "{value:.SNAPSHOT_DECIMALS$}");
}

fn write_bound(out: &mut String, bound: Option<f64>) {
    match bound {
        Some(value) => write_f64(out, value),
        None => out.push('*'),
    }
}

#[derive(Debug, Clone, Copy)]
enum Scenario {
    Paraboloid,
    Saddle,
    Ripple,
    SqrtEdge,
    TwinPeaks,
}

impl Scenario {
    const ALL: &'static [Scenario] = &[
        Scenario::Paraboloid,
        Scenario::Saddle,
        Scenario::Ripple,
        Scenario::SqrtEdge,
        Scenario::TwinPeaks,
    ];

    fn name(self) -> &'static str {
        match self {
            Scenario::Paraboloid => "paraboloid",
            Scenario::Saddle => "saddle",
            Scenario::Ripple => "ripple",
            Scenario::SqrtEdge => "sqrt_edge",
            Scenario::TwinPeaks => "twin_peaks",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        Scenario::ALL.iter().copied().find(|s| s.name() == name)
    }

    fn expression(self) -> &'static str {
        match self {
            Scenario::Paraboloid => "x^2 + y^2",
            Scenario::Saddle => "(x - 5) * (y - 5)",
            Scenario::Ripple => "sin(x) + cos(y)",
            Scenario::SqrtEdge => "sqrt(x - 3)",
            Scenario::TwinPeaks => {
                "exp(-((x - 3)^2 + (y - 3)^2) / 4) - exp(-((x - 7)^2 + (y - 7)^2) / 4)"
            }
        }
    }

    fn levels(self) -> &'static [f64] {
        match self {
            Scenario::Paraboloid => &[25.0, 50.0],
            Scenario::Saddle => &[-5.0, 0.5, 5.0],
            Scenario::Ripple => &[-1.0, 0.0, 1.0],
            Scenario::SqrtEdge => &[1.0, 2.0],
            Scenario::TwinPeaks => &[-0.5, 0.05, 0.5],
        }
    }
}

struct Args {
    args: Vec<String>,
    pos: usize,
}

impl Args {
    fn new(args: Vec<String>) -> Self {
        Self { args, pos: 0 }
    }

    fn next(&mut self) -> Option<String> {
        let arg = self.args.get(self.pos)?.clone();
        self.pos += 1;
        Some(arg)
    }

    fn value(&mut self, flag: &str) -> Result<String, String> {
        self.next().ok_or_else(|| format!("missing value for {flag}"))
    }
}

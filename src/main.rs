use std::{env, path::PathBuf, process};

use anyhow::{Context, Result};
use serde::Serialize;
use vrmmeta::{
    LogLevel, MetaError,
    convert::{
        AssetContext, LicenseRecord, RenamedVariants, VrmMeta, convert_vrm_meta,
        generate_renamed_variants,
    },
    init_logging,
    scene::{LegacyMetadata, read_gltf_json},
    settings::{ConvertSettings, load_settings},
};

const USAGE: &str =
    "Usage: vrmmeta <input.vrm> [--settings <file.json>] [--strict-names] [--renamed] [--verbose]";

#[derive(Serialize)]
struct Report<'a> {
    meta: &'a VrmMeta,
    license: &'a LicenseRecord,
    renamed: Option<RenamedVariants>,
}

struct Args {
    input: PathBuf,
    settings: Option<PathBuf>,
    strict_names: bool,
    renamed: bool,
    verbose: bool,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err}");
        process::exit(1);
    }
}

fn run() -> Result<()> {
    let args = match parse_args(env::args().skip(1)) {
        Ok(args) => args,
        Err(reason) => {
            eprintln!("{reason}\n{USAGE}");
            process::exit(2);
        }
    };

    let mut settings = match &args.settings {
        Some(path) => load_settings(path)?,
        None => ConvertSettings::default(),
    };
    settings.strict_morph_target_names |= args.strict_names;
    settings.generate_renamed_variants |= args.renamed;
    settings.verbose |= args.verbose;

    init_logging(if settings.verbose {
        LogLevel::Debug
    } else {
        LogLevel::Warn
    });

    let json = read_gltf_json(&args.input)
        .with_context(|| format!("failed to read VRM/glTF: {}", args.input.display()))?;
    let options = settings.to_options(&json);
    let scene_meta = LegacyMetadata::from_gltf_json(&json);
    let assets = AssetContext::from_gltf_json(&json);

    let output = match convert_vrm_meta(Some(&json), scene_meta.as_ref(), Some(&assets), &options)
    {
        Ok(output) => output,
        Err(MetaError::MissingMetadata) => {
            anyhow::bail!("{} has no VRM metadata", args.input.display())
        }
        Err(err) => return Err(err.into()),
    };

    let report = Report {
        meta: &output.meta,
        license: &output.license,
        renamed: generate_renamed_variants(&output.meta, &options),
    };
    let rendered =
        serde_json::to_string_pretty(&report).context("failed to serialize conversion output")?;
    println!("{rendered}");

    Ok(())
}

fn parse_args(mut raw: impl Iterator<Item = String>) -> Result<Args, String> {
    let mut input = None;
    let mut args = Args {
        input: PathBuf::new(),
        settings: None,
        strict_names: false,
        renamed: false,
        verbose: false,
    };

    while let Some(arg) = raw.next() {
        match arg.as_str() {
            "--settings" => {
                let path = raw.next().ok_or("--settings requires a file path")?;
                args.settings = Some(PathBuf::from(path));
            }
            "--strict-names" => args.strict_names = true,
            "--renamed" => args.renamed = true,
            "--verbose" => args.verbose = true,
            flag if flag.starts_with("--") => return Err(format!("unknown option: {flag}")),
            path if input.is_none() => input = Some(PathBuf::from(path)),
            extra => return Err(format!("unexpected argument: {extra}")),
        }
    }

    args.input = input.ok_or("missing input file")?;
    Ok(args)
}

//! `kairos check-data`: parse a device series' delay data and summarize it.

use kairos_config::resolve_paths;
use kairos_timing::{DataError, DelayTables, InterconnectTerms};

use crate::pipeline::{data_error_diagnostic, load_config, render_diagnostics};
use crate::{CheckDataArgs, GlobalArgs};

/// Runs the `kairos check-data` command.
///
/// Returns exit code 0 when both data files parse, 1 otherwise.
pub fn run(args: &CheckDataArgs, global: &GlobalArgs) -> Result<i32, Box<dyn std::error::Error>> {
    let (mut config, base_dir) = load_config(global)?;
    if let Some(dir) = &args.data_dir {
        config.device.data_dir = dir.clone();
    }
    if let Some(series) = &args.series {
        config.device.series = series.clone();
    }
    let paths = resolve_paths(&config, &base_dir)?;

    match summarize(&paths.intrasite, &paths.intersite) {
        Ok(lines) => {
            if !global.quiet {
                println!("{} delay data OK", paths.series);
                for line in lines {
                    println!("  {line}");
                }
            }
            Ok(0)
        }
        Err(err) => {
            render_diagnostics(&[data_error_diagnostic(&err)], global);
            Ok(1)
        }
    }
}

fn summarize(
    intrasite: &std::path::Path,
    intersite: &std::path::Path,
) -> Result<Vec<String>, DataError> {
    let tables = DelayTables::load(intrasite)?;
    let terms = InterconnectTerms::load(intersite)?;
    let terms_hash = terms
        .source_hash
        .map_or_else(|| "-".to_string(), |h| h.short());
    Ok(vec![
        format!(
            "{}: {} logic arcs, {} intra-site arcs [{}]",
            intrasite.display(),
            tables.logic_entry_count(),
            tables.intra_site_entry_count(),
            tables.content_hash().short()
        ),
        format!(
            "{}: {} terms set [{terms_hash}]",
            intersite.display(),
            terms.terms_read
        ),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn data_dir(intrasite: &str, intersite: &str) -> TempDir {
        let tmp = TempDir::new().unwrap();
        let series = tmp.path().join("ultrascaleplus");
        fs::create_dir_all(&series).unwrap();
        fs::write(series.join(kairos_config::INTRASITE_FILE), intrasite).unwrap();
        fs::write(series.join(kairos_config::INTERSITE_FILE), intersite).unwrap();
        tmp
    }

    fn args(tmp: &TempDir) -> CheckDataArgs {
        CheckDataArgs {
            data_dir: Some(tmp.path().display().to_string()),
            series: Some("ultrascaleplus".to_string()),
        }
    }

    fn global() -> GlobalArgs {
        GlobalArgs {
            quiet: true,
            verbose: 0,
            color: false,
            config: None,
        }
    }

    #[test]
    fn valid_data_passes() {
        let tmp = data_dir("bel A6LUT\nA1 O6 150\n", "LOGIC_FF_DELAY 80\n");
        assert_eq!(run(&args(&tmp), &global()).unwrap(), 0);
    }

    #[test]
    fn summary_counts_entries() {
        let tmp = data_dir(
            "bel A6LUT\nA1 O6 150\nA2 O6 140\nsite SLICEL\nA6LUT/O6 AFF/D 48\n",
            "LOGIC_FF_DELAY 80\nBOUNCE_DELAY 20\n",
        );
        let series = tmp.path().join("ultrascaleplus");
        let lines = summarize(
            &series.join(kairos_config::INTRASITE_FILE),
            &series.join(kairos_config::INTERSITE_FILE),
        )
        .unwrap();
        assert!(lines[0].contains("2 logic arcs, 1 intra-site arcs"));
        assert!(lines[1].contains("2 terms set"));
    }

    #[test]
    fn unknown_term_fails() {
        let tmp = data_dir("", "NOT_A_TERM 1\n");
        assert_eq!(run(&args(&tmp), &global()).unwrap(), 1);
    }

    #[test]
    fn missing_series_fails() {
        let tmp = data_dir("", "");
        let mut a = args(&tmp);
        a.series = Some("versal".to_string());
        assert_eq!(run(&a, &global()).unwrap(), 1);
    }
}

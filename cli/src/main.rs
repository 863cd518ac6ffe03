use crate::cli::{Args, Command};
use anyhow::{bail, Context};
use clap::Parser;
use oxpoints::dataset::Dataset;
use oxpoints::gpsbabel::GpsBabel;
use oxpoints::output::{render, OutputOptions};
use oxpoints::query::Query;
use oxpoints_web::{AdminContact, ServerConfig};
use std::io::{stdout, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
pub async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let matches = Args::parse();
    match matches.command {
        Command::Serve {
            data,
            bind,
            cors,
            read_only,
            gpsbabel,
            base_url,
            admin_name,
            admin_email,
        } => {
            let mut config = ServerConfig::new(Arc::new(load_dataset(&data)?));
            config.base_url = base_url.unwrap_or_else(|| format!("http://{bind}"));
            config.bind = bind;
            config.cors = cors;
            config.read_only = read_only;
            config.gpsbabel = gpsbabel;
            let default_admin = AdminContact::default();
            config.admin = AdminContact {
                name: admin_name.unwrap_or(default_admin.name),
                email: admin_email.unwrap_or(default_admin.email),
            };
            oxpoints_web::serve(config).await
        }
        Command::Query {
            data,
            path,
            param,
            gpsbabel,
        } => {
            let dataset = load_dataset(&data)?;
            let query = Query::from_request(Some(&path), &param, &dataset.ontology())
                .with_context(|| format!("Invalid query {path}"))?;
            let snapshot = dataset.snapshot(query.time_instant());
            let gpsbabel = GpsBabel::new(gpsbabel);
            let output = render(&query, &snapshot, OutputOptions::new(&gpsbabel)).await?;
            if output.status != 200 {
                bail!("{}", output.body.trim_end());
            }
            let mut stdout = stdout().lock();
            stdout.write_all(output.body.as_bytes())?;
            stdout.flush()?;
            Ok(())
        }
    }
}

fn load_dataset(files: &[PathBuf]) -> anyhow::Result<Dataset> {
    let dataset = Dataset::new()?;
    for file in files {
        load_file(&dataset, file)?;
    }
    info!(files = files.len(), quads = dataset.len()?, "Dataset loaded");
    Ok(dataset)
}

fn load_file(dataset: &Dataset, file: &Path) -> anyhow::Result<()> {
    dataset
        .load_file(file)
        .with_context(|| format!("Not able to load {}", file.display()))
}

#[cfg(test)]
#[allow(clippy::panic_in_result_fn)]
mod tests {
    use super::*;
    use anyhow::Result;
    use assert_cmd::Command;
    use assert_fs::prelude::*;
    use assert_fs::NamedTempFile;
    use predicates::prelude::*;

    const FIXTURE: &str = concat!(
        env!("CARGO_MANIFEST_DIR"),
        "/../lib/oxpoints/tests/data/oxpoints.ttl"
    );

    fn cli_command() -> Command {
        let mut command = Command::new(env!("CARGO"));
        command.arg("run").arg("--bin").arg("oxpoints");
        command.arg("--");
        command
    }

    #[test]
    fn cli_help() {
        cli_command()
            .assert()
            .failure()
            .stdout("")
            .stderr(predicate::str::contains("OxPoints"));
    }

    #[test]
    fn cli_query_kml() {
        cli_command()
            .arg("query")
            .arg("--data")
            .arg(FIXTURE)
            .arg("/type/College.kml")
            .assert()
            .success()
            .stdout(predicate::str::contains("<Placemark id=\"23232373\">"));
    }

    #[test]
    fn cli_query_with_params() {
        cli_command()
            .arg("query")
            .arg("--data")
            .arg(FIXTURE)
            .arg("/type/Building.gjson")
            .arg("--param")
            .arg("jsCallback=show")
            .assert()
            .success()
            .stdout(predicate::str::starts_with("show({"));
    }

    #[test]
    fn cli_query_unknown_type() {
        cli_command()
            .arg("query")
            .arg("--data")
            .arg(FIXTURE)
            .arg("/type/Castle.kml")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Found no URI matching type Castle"));
    }

    #[test]
    fn cli_query_several_files() -> Result<()> {
        let extra = NamedTempFile::new("extra.nt")?;
        extra.write_str(
            "<http://oxpoints.oucs.ox.ac.uk/id/23239999> <http://purl.org/dc/elements/1.1/title> \"Wolfson College\" .\n",
        )?;
        cli_command()
            .arg("query")
            .arg("--data")
            .arg(FIXTURE)
            .arg("--data")
            .arg(extra.path())
            .arg("/next")
            .assert()
            .success()
            .stdout("23240000");
        Ok(())
    }

    #[test]
    fn cli_query_malformed_param() {
        cli_command()
            .arg("query")
            .arg("--data")
            .arg(FIXTURE)
            .arg("/next")
            .arg("--param")
            .arg("jsCallback")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Expected name=value"));
    }

    #[test]
    fn clap_debug() {
        use clap::CommandFactory;

        Args::command().debug_assert()
    }
}

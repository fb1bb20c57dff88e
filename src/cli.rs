// Copyright 2025 Fernando Borretti
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use clap::Parser;

use crate::cmd::export::export_data;
use crate::cmd::stats::StatsFormat;
use crate::cmd::stats::print_stats;
use crate::error::Fallible;
use crate::server::app::start_server;

#[derive(Parser)]
#[command(version, about, long_about = None)]
enum Command {
    /// Serve the flashcard API.
    Serve {
        /// Path to the data directory. Defaults to $APP_DATA_DIR, then ./data.
        directory: Option<String>,
        /// The port to listen on.
        #[arg(long, default_value_t = 8000)]
        port: u16,
    },
    /// Print card counts.
    Stats {
        /// Path to the data directory. Defaults to $APP_DATA_DIR, then ./data.
        directory: Option<String>,
        /// Which output format to use.
        #[arg(long, default_value_t = StatsFormat::Json)]
        format: StatsFormat,
    },
    /// Export all collections and cards as JSON.
    Export {
        /// Path to the data directory. Defaults to $APP_DATA_DIR, then ./data.
        directory: Option<String>,
    },
}

pub async fn entrypoint() -> Fallible<()> {
    let cli: Command = Command::parse();
    match cli {
        Command::Serve { directory, port } => start_server(directory, port).await,
        Command::Stats { directory, format } => print_stats(directory, format),
        Command::Export { directory } => export_data(directory),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_is_well_formed() {
        Command::command().debug_assert();
    }

    #[test]
    fn test_parse_serve() {
        let cli = Command::try_parse_from(["flashsched", "serve", "/tmp/cards", "--port", "9000"]);
        match cli {
            Ok(Command::Serve { directory, port }) => {
                assert_eq!(directory.as_deref(), Some("/tmp/cards"));
                assert_eq!(port, 9000);
            }
            _ => panic!("expected serve"),
        }
        match Command::try_parse_from(["flashsched", "serve"]) {
            Ok(Command::Serve { directory, port }) => {
                assert!(directory.is_none());
                assert_eq!(port, 8000);
            }
            _ => panic!("expected serve"),
        }
    }
}

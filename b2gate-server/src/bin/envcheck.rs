// Copyright 2026 B2Gate Team
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

//! Prints which storage variables are set, masked, and which alias wins.
//!
//! Exits with status 1 when the server would refuse to start.

use b2gate_core::EnvSource;
use b2gate_server::envcheck::check_environment;

fn main() {
    match dotenvy::dotenv() {
        Ok(path) => println!("Loaded {}", path.display()),
        Err(e) if e.not_found() => println!("No .env file found, using process environment"),
        Err(e) => {
            eprintln!("Failed to read .env file: {}", e);
            std::process::exit(1);
        }
    }
    println!();

    let report = check_environment(&EnvSource);
    for line in &report.lines {
        println!("{}", line);
    }

    if !report.ok {
        std::process::exit(1);
    }
}

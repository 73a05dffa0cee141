//! Test data fixtures for the mock server.

use super::state::MockState;

/// Collection of fixture factories for test data.
pub struct Fixtures;

/// App that owns the default volume.
pub const APP: &str = "example-go";

/// The default volume.
pub const VOLUME: &str = "myvolume";

/// Content of `tmp/helloword.txt` on the default volume.
pub const HELLO_WORLD: &[u8] = b"hello world";

/// A predefined set of files for common test scenarios.
pub struct DefaultScenario {
    /// (app, volume, path, content)
    pub files: Vec<(String, String, String, Vec<u8>)>,
    /// Volumes without files, as (app, volume).
    pub empty_volumes: Vec<(String, String)>,
}

impl Fixtures {
    /// The default scenario: one populated volume and one empty one.
    pub fn default_scenario() -> DefaultScenario {
        let file = |path: &str, content: &[u8]| {
            (APP.to_string(), VOLUME.to_string(), path.to_string(), content.to_vec())
        };

        DefaultScenario {
            files: vec![
                file("tmp/helloword.txt", HELLO_WORLD),
                file("tmp/logs/build.log", b"step 1/3\nstep 2/3\nstep 3/3\n"),
                file("README.md", b"# data volume\n"),
            ],
            empty_volumes: vec![(APP.to_string(), "scratch".to_string())],
        }
    }

    /// State holding a single file.
    pub fn single_file(app: &str, volume: &str, path: &str, content: &[u8]) -> MockState {
        MockState::new().with_file(app, volume, path, content)
    }
}

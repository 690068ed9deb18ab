use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub bind: String,
    pub port: u16,
    // Persistence
    pub dir: String,
    pub dbfilename: String,
    /// Seconds between background snapshots. 0 disables them.
    pub save_interval: u64,
    /// Active expiry sweeps per second.
    pub hz: u64,
    pub loglevel: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: "127.0.0.1".to_string(),
            port: 6379,
            dir: ".".to_string(),
            dbfilename: "dump.mdb".to_string(),
            save_interval: 300,
            hz: 10,
            loglevel: "info".to_string(),
        }
    }
}

impl Config {
    /// Build a config from `--flag value` pairs. Unknown flags and values that
    /// fail to parse are ignored. A bare number as the first argument is
    /// taken as the port.
    pub fn from_args(args: &[String]) -> Self {
        let mut config = Config::default();
        let mut i = 0;

        if let Some(port) = args.first().and_then(|a| a.parse().ok()) {
            config.port = port;
            i = 1;
        }

        while i < args.len() {
            let value = args.get(i + 1);
            match (args[i].as_str(), value) {
                ("--port", Some(v)) => {
                    if let Ok(p) = v.parse() {
                        config.port = p;
                    }
                    i += 1;
                }
                ("--bind", Some(v)) => {
                    config.bind = v.clone();
                    i += 1;
                }
                ("--dir", Some(v)) => {
                    config.dir = v.clone();
                    i += 1;
                }
                ("--dbfilename", Some(v)) => {
                    config.dbfilename = v.clone();
                    i += 1;
                }
                ("--save-interval", Some(v)) => {
                    if let Ok(s) = v.parse() {
                        config.save_interval = s;
                    }
                    i += 1;
                }
                ("--hz", Some(v)) => {
                    if let Ok(h) = v.parse() {
                        config.hz = h;
                    }
                    i += 1;
                }
                ("--loglevel", Some(v)) => {
                    config.loglevel = v.clone();
                    i += 1;
                }
                _ => {}
            }
            i += 1;
        }
        config
    }

    pub fn snapshot_path(&self) -> PathBuf {
        PathBuf::from(&self.dir).join(&self.dbfilename)
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_args(&[]);
        assert_eq!(config, Config::default());
        assert_eq!(config.listen_addr(), "127.0.0.1:6379");
        assert_eq!(config.snapshot_path(), PathBuf::from("./dump.mdb"));
    }

    #[test]
    fn test_flags() {
        let config = Config::from_args(&args(&[
            "--port", "7000", "--bind", "0.0.0.0", "--dir", "/tmp/data", "--dbfilename",
            "state.mdb", "--save-interval", "0", "--hz", "50", "--loglevel", "debug",
        ]));
        assert_eq!(config.port, 7000);
        assert_eq!(config.bind, "0.0.0.0");
        assert_eq!(config.save_interval, 0);
        assert_eq!(config.hz, 50);
        assert_eq!(config.loglevel, "debug");
        assert_eq!(config.snapshot_path(), PathBuf::from("/tmp/data/state.mdb"));
    }

    #[test]
    fn test_positional_port() {
        let config = Config::from_args(&args(&["6380", "--hz", "5"]));
        assert_eq!(config.port, 6380);
        assert_eq!(config.hz, 5);
    }

    #[test]
    fn test_bad_values_are_ignored() {
        let config = Config::from_args(&args(&["--port", "nope", "--unknown", "--hz"]));
        assert_eq!(config.port, 6379);
        assert_eq!(config.hz, 10);
    }
}

// crates/strand-cli/src/commands/init.rs
//
// `strand init`: write ~/.strand/config.toml and generate the node key.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;

use strand_core::crypto::Keypair;

/// The subset of daemon config `init` writes. Everything else is defaulted.
#[derive(Debug, Serialize)]
struct InitConfig {
    log_level: String,
    node: InitNode,
    rpc: InitRpc,
    probe: InitProbe,
}

#[derive(Debug, Serialize)]
struct InitNode {
    data_dir: String,
    key_path: String,
    share_root: String,
}

#[derive(Debug, Serialize)]
struct InitRpc {
    host: String,
    port: u16,
}

#[derive(Debug, Serialize)]
struct InitProbe {
    timeout_secs: u64,
    interval_secs: u64,
    max_concurrency: usize,
}

fn default_config(root: &Path) -> InitConfig {
    InitConfig {
        log_level: "info".to_string(),
        node: InitNode {
            data_dir: root.join("data").to_string_lossy().to_string(),
            key_path: root.join("node.key").to_string_lossy().to_string(),
            share_root: root.join("shared").to_string_lossy().to_string(),
        },
        rpc: InitRpc {
            host: "127.0.0.1".to_string(),
            port: 50051,
        },
        probe: InitProbe {
            timeout_secs: 10,
            interval_secs: 300,
            max_concurrency: 8,
        },
    }
}

/// Run the init command.
pub async fn run(force: bool) -> Result<(), Box<dyn std::error::Error>> {
    let root = strand_dir()?;
    fs::create_dir_all(&root)?;

    let config_path = root.join("config.toml");
    let config = default_config(&root);
    if config_path.exists() && !force {
        println!("Config already exists: {}", config_path.display());
        println!("  (use --force to overwrite)");
    } else {
        fs::write(&config_path, toml::to_string_pretty(&config)?)?;
        println!("Wrote config: {}", config_path.display());
    }

    fs::create_dir_all(&config.node.share_root)?;

    let key_path = PathBuf::from(&config.node.key_path);
    let (keypair, generated) = Keypair::load_or_generate(&key_path)?;
    if generated {
        println!("Generated node key: {}", key_path.display());
    } else {
        println!("Using existing node key: {}", key_path.display());
    }
    println!("  Node ID: {}", keypair.node_id());
    println!();
    println!("Set node.self_url in the config so peers can probe this node.");

    Ok(())
}

fn strand_dir() -> Result<PathBuf, Box<dyn std::error::Error>> {
    let home = dirs::home_dir().ok_or("Could not determine home directory")?;
    Ok(home.join(".strand"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid_toml() {
        let config = default_config(Path::new("/tmp/strand-home"));
        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: toml::Value = toml::from_str(&text).unwrap();
        assert_eq!(parsed["rpc"]["port"].as_integer(), Some(50051));
        assert_eq!(
            parsed["node"]["key_path"].as_str(),
            Some("/tmp/strand-home/node.key")
        );
        let share_root = parsed["node"]["share_root"].as_str().unwrap();
        assert!(!Path::new("/tmp/strand-home/node.key").starts_with(share_root));
    }
}

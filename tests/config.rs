// ABOUTME: Integration tests for configuration parsing and validation.
// ABOUTME: Tests YAML parsing, file discovery and derivation of deploy inputs.

use burrow::config::*;
use burrow::daemon::Protocol;
use burrow::error::Error;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const MINIMAL: &str = r#"
container: hello_world
image: gojoe2/hello_world
build:
  context: .
registry:
  username: gojoe2
remote:
  host: ssh.gojoe.dev
  user: deepwater
publish:
  container_port: 80
  host_port: 3004
"#;

mod parsing {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let config = Config::from_yaml(MINIMAL).unwrap();
        assert_eq!(config.container.as_str(), "hello_world");
        assert_eq!(config.image.to_string(), "gojoe2/hello_world:latest");
        assert_eq!(config.remote.host, "ssh.gojoe.dev");
        assert_eq!(config.remote.tunnel.head, "cloudflared");
        assert_eq!(config.remote.socket, "/var/run/docker.sock");
        assert_eq!(config.remote.connect_timeout, Duration::from_secs(5));
        assert!(config.network.is_none());
        assert!(config.labels.is_empty());
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
container: api
image: registry.example.com/team/api:v2
build:
  context: ./service
  dockerfile: Dockerfile.prod
registry:
  username: team
  token_file: secrets/registry-token
  server: registry.example.com
remote:
  host: box.internal
  user: ops
  key_path: /keys/deploy
  tunnel: [ssh-proxy, --via, bastion]
  socket: /run/user/1000/docker.sock
  connect_timeout: 30s
local:
  socket: /var/run/docker.sock
publish:
  container_port: 5353
  host_port: 53
  host_ip: 127.0.0.1
  protocol: udp
network: backend
stop_timeout: 1m
labels:
  team: platform
"#;
        let config = Config::from_yaml(yaml).unwrap();

        assert_eq!(config.build.dockerfile, "Dockerfile.prod");
        assert_eq!(
            config.registry.server.as_deref(),
            Some("registry.example.com")
        );
        assert_eq!(config.remote.tunnel.head, "ssh-proxy");
        assert_eq!(config.remote.tunnel.tail, vec!["--via", "bastion"]);
        assert_eq!(config.remote.connect_timeout, Duration::from_secs(30));
        assert_eq!(config.publish.protocol, Protocol::Udp);
        assert_eq!(config.stop_timeout, Duration::from_secs(60));
        assert_eq!(config.labels.get("team").map(String::as_str), Some("platform"));

        let target = config.target();
        assert_eq!(target.publish.port_key(), "5353/udp");
        assert_eq!(target.publish.host_ip, "127.0.0.1");
        assert_eq!(target.network.as_deref(), Some("backend"));
    }

    #[test]
    fn session_config_follows_remote_settings() {
        let yaml = MINIMAL.replace(
            "  user: deepwater\n",
            "  user: deepwater\n  key_path: /keys/deploy\n  connect_timeout: 2s\n",
        );
        let session = Config::from_yaml(&yaml).unwrap().remote.ssh_session_config();

        assert_eq!(session.host, "ssh.gojoe.dev");
        assert_eq!(session.user, "deepwater");
        assert_eq!(session.key_path, PathBuf::from("/keys/deploy"));
        assert_eq!(session.connect_timeout, Duration::from_secs(2));
    }
}

mod validation {
    use super::*;

    #[test]
    fn missing_remote_is_a_yaml_error() {
        let yaml = MINIMAL.replace("remote:\n  host: ssh.gojoe.dev\n  user: deepwater\n", "");
        assert!(matches!(Config::from_yaml(&yaml), Err(Error::Yaml(_))));
    }

    #[test]
    fn blank_host_is_rejected() {
        let yaml = MINIMAL.replace("host: ssh.gojoe.dev", "host: \"  \"");
        let err = Config::from_yaml(&yaml).unwrap_err();
        assert!(matches!(err, Error::InvalidConfig(_)));
        assert!(err.to_string().contains("remote.host"));
    }

    #[test]
    fn empty_tunnel_is_rejected() {
        let yaml = MINIMAL.replace("  user: deepwater\n", "  user: deepwater\n  tunnel: []\n");
        assert!(Config::from_yaml(&yaml).is_err());
    }

    #[test]
    fn blank_tunnel_argument_is_rejected() {
        let yaml = MINIMAL.replace(
            "  user: deepwater\n",
            "  user: deepwater\n  tunnel: [cloudflared, \"\"]\n",
        );
        assert!(Config::from_yaml(&yaml).is_err());
    }

    #[test]
    fn unknown_protocol_is_rejected() {
        let yaml = MINIMAL.replace("host_port: 3004", "host_port: 3004\n  protocol: sctp");
        assert!(matches!(Config::from_yaml(&yaml), Err(Error::Yaml(_))));
    }

    #[test]
    fn digest_image_is_rejected() {
        for image in [
            "gojoe2/hello_world@sha256:0123abcd",
            "gojoe2/hello_world:v1@sha256:0123abcd",
        ] {
            let yaml = MINIMAL.replace("image: gojoe2/hello_world", &format!("image: {image}"));
            let err = Config::from_yaml(&yaml).unwrap_err();
            assert!(matches!(err, Error::InvalidConfig(_)), "{image}: {err:?}");
            assert!(err.to_string().contains("digest"));
        }
    }

    #[test]
    fn blank_network_is_rejected() {
        let yaml = format!("{MINIMAL}network: \" \"\n");
        assert!(matches!(
            Config::from_yaml(&yaml),
            Err(Error::InvalidConfig(_))
        ));
    }
}

mod discovery {
    use super::*;

    #[test]
    fn prefers_yml_over_yaml() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), MINIMAL).unwrap();
        fs::write(
            dir.path().join(CONFIG_FILENAME_ALT),
            MINIMAL.replace("hello_world\n", "other\n"),
        )
        .unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(config.container.as_str(), "hello_world");
    }

    #[test]
    fn falls_back_to_yaml_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME_ALT), MINIMAL).unwrap();

        assert!(Config::discover(dir.path()).is_ok());
    }

    #[test]
    fn registry_token_is_read_relative_to_config() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = MINIMAL.replace(
            "username: gojoe2\n",
            "username: gojoe2\n  server: https://index.docker.io/v1/\n",
        );
        fs::write(dir.path().join(CONFIG_FILENAME), yaml).unwrap();
        fs::write(dir.path().join(".dockerhub"), "  dckr_pat_abc\n").unwrap();

        let config = Config::load(&dir.path().join(CONFIG_FILENAME)).unwrap();
        let auth = config.registry_auth().unwrap();

        assert_eq!(auth.username(), "gojoe2");
        assert_eq!(auth.server_address(), Some("https://index.docker.io/v1/"));
        assert!(!format!("{auth:?}").contains("dckr_pat_abc"));
    }

    #[test]
    fn missing_token_file_is_a_credential_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILENAME), MINIMAL).unwrap();

        let config = Config::load(&dir.path().join(CONFIG_FILENAME)).unwrap();
        assert!(config.registry_auth().is_err());
    }

    #[test]
    fn local_socket_resolves_against_config_dir() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = format!("{MINIMAL}local:\n  socket: run/docker.sock\n");
        fs::write(dir.path().join(CONFIG_FILENAME), yaml).unwrap();

        let config = Config::discover(dir.path()).unwrap();
        assert_eq!(
            config.local_socket(),
            Some(dir.path().join("run/docker.sock"))
        );
    }

    #[test]
    fn home_prefix_is_expanded() {
        let expanded = expand_home(std::path::Path::new("~/.ssh/id_ed25519"));
        if let Some(home) = std::env::var_os("HOME") {
            assert_eq!(expanded, PathBuf::from(home).join(".ssh/id_ed25519"));
        }
        assert_eq!(
            expand_home(std::path::Path::new("/etc/key")),
            PathBuf::from("/etc/key")
        );
    }
}

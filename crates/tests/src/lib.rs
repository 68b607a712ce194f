//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 三种轮转策略的 e2e 测试 (ingestion → relay → 文件)
//! - 配置加载到 relay 构建的错误路径

#[cfg(test)]
mod contract_tests {
    use contracts::{ByteSize, SignalKind};

    #[test]
    fn test_size_grammar_snapshot() {
        for (input, expected) in [
            ("1024", 1024),
            ("1024 kb", 1024 * 1024),
            (" 1 MB ", 1024 * 1024),
            (" 1 gb ", 1024 * 1024 * 1024),
        ] {
            assert_eq!(input.parse::<ByteSize>().unwrap().bytes(), expected, "{input:?}");
        }
        for input in ["", "0s98f", "10294 TB"] {
            assert!(input.parse::<ByteSize>().is_err(), "{input:?}");
        }
    }

    #[test]
    fn test_signal_table_snapshot() {
        let names: Vec<_> = SignalKind::all().map(SignalKind::name).collect();
        assert_eq!(
            names,
            ["HUP", "INT", "QUIT", "USR1", "USR2", "TERM", "ALRM", "CHLD", "PIPE", "IO", "WINCH"]
        );
        assert_eq!(SignalKind::Hup.raw(), libc::SIGHUP);
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::fs;
    use std::io::Cursor;
    use std::path::Path;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{RelayConfig, RotationConfig, SignalKind};
    use ingestion::{spawn_reader, IngestionError, LineSource, ReadMode, ReaderConfig};
    use relay::{create_relay, RelayError};
    use rotation::{backup_path, Policy};
    use tempfile::tempdir;
    use tokio::sync::mpsc;

    type LineSender = mpsc::Sender<Result<String, IngestionError>>;

    async fn send_lines(tx: &LineSender, lines: impl IntoIterator<Item = String>) {
        for line in lines {
            tx.send(Ok(line)).await.unwrap();
        }
    }

    /// Wait until `path` holds exactly `lines` lines
    async fn wait_for_lines(path: &Path, lines: usize) {
        for _ in 0..400 {
            let count = fs::read_to_string(path)
                .map(|content| content.lines().count())
                .unwrap_or(0);
            if count == lines {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("{} never reached {lines} lines", path.display());
    }

    fn numbered(prefix: &str, n: usize) -> Vec<String> {
        (0..n).map(|i| format!("{prefix} {i}")).collect()
    }

    fn joined(lines: &[String]) -> String {
        lines.iter().map(|l| format!("{l}\n")).collect()
    }

    /// End-to-end test: N lines, external rename, M lines
    ///
    /// 验证：
    /// 1. 重命名后的文件恰好包含前 N 行
    /// 2. 原路径被重新创建，恰好包含后 M 行
    #[tokio::test]
    async fn test_e2e_watched_rename() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("foo.out");
        let moved = dir.path().join("foo.out.moved");

        let relay = create_relay(&RelayConfig::new(&path)).unwrap();
        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(relay.run(rx));

        let before = numbered("before", 10);
        let after = numbered("after", 7);

        send_lines(&tx, before.clone()).await;
        wait_for_lines(&path, before.len()).await;
        fs::rename(&path, &moved).unwrap();

        send_lines(&tx, after.clone()).await;
        drop(tx);

        let stats = task.await.unwrap().unwrap();
        assert_eq!(stats.lines, 17);
        assert_eq!(stats.rotations, 1);
        assert_eq!(stats.generation, 1);
        assert!(path.exists());
        assert_eq!(fs::read_to_string(&moved).unwrap(), joined(&before));
        assert_eq!(fs::read_to_string(&path).unwrap(), joined(&after));
    }

    /// End-to-end test: watched file deleted instead of renamed
    #[tokio::test]
    async fn test_e2e_watched_delete() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("foo.out");

        let relay = create_relay(&RelayConfig::new(&path)).unwrap();
        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(relay.run(rx));

        send_lines(&tx, numbered("gone", 3)).await;
        wait_for_lines(&path, 3).await;
        fs::remove_file(&path).unwrap();

        let kept = numbered("kept", 2);
        send_lines(&tx, kept.clone()).await;
        drop(tx);

        task.await.unwrap().unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), joined(&kept));
    }

    /// End-to-end test: rename, then deliver the configured signal
    #[tokio::test]
    async fn test_e2e_signaled_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("foo.out");
        let moved = dir.path().join("foo.out.1");

        let config = RelayConfig::new(&path).with_rotation(RotationConfig::Signaled {
            signal: "SIGUSR2".into(),
        });
        let relay = create_relay(&config).unwrap();
        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(relay.run(rx));

        let before = numbered("before", 5);
        send_lines(&tx, before.clone()).await;
        wait_for_lines(&path, before.len()).await;

        fs::rename(&path, &moved).unwrap();
        // SAFETY: a tokio handler for SIGUSR2 is installed by create_relay.
        assert_eq!(unsafe { libc::raise(SignalKind::Usr2.raw()) }, 0);

        // The reopen recreates the original path.
        for _ in 0..400 {
            if path.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(path.exists());

        let after = numbered("after", 4);
        send_lines(&tx, after.clone()).await;
        drop(tx);

        let stats = task.await.unwrap().unwrap();
        assert_eq!(stats.rotations, 1);
        assert_eq!(fs::read_to_string(&moved).unwrap(), joined(&before));
        assert_eq!(fs::read_to_string(&path).unwrap(), joined(&after));
    }

    /// End-to-end test: signaled rotation while a buffered reader waits on an idle pipe
    ///
    /// 信号由 tokio 驱动接收，不会打断读线程，因此缓冲模式同样可用。
    #[tokio::test]
    async fn test_e2e_signaled_with_buffered_reader() {
        use std::io::Write;
        use std::os::unix::net::UnixStream;

        let dir = tempdir().unwrap();
        let path = dir.path().join("foo.out");
        let moved = dir.path().join("foo.out.1");

        let config = RelayConfig::new(&path).with_rotation(RotationConfig::Signaled {
            signal: "WINCH".into(),
        });
        let relay = create_relay(&config).unwrap();

        let (mut producer, consumer) = UnixStream::pair().unwrap();
        let source = LineSource::new(consumer, ReaderConfig::default());
        let (rx, _reader) = spawn_reader(source, ReadMode::Buffered, 8).unwrap();
        let task = tokio::spawn(relay.run(rx));

        producer.write_all(b"one\ntwo\n").unwrap();
        wait_for_lines(&path, 2).await;

        fs::rename(&path, &moved).unwrap();
        // SAFETY: a tokio handler for SIGWINCH is installed by create_relay.
        assert_eq!(unsafe { libc::raise(SignalKind::Winch.raw()) }, 0);
        for _ in 0..400 {
            if path.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(path.exists());

        producer.write_all(b"three\n").unwrap();
        drop(producer);

        let stats = task.await.unwrap().unwrap();
        assert_eq!(stats.lines, 3);
        assert_eq!(stats.rotations, 1);
        assert_eq!(fs::read_to_string(&moved).unwrap(), "one\ntwo\n");
        assert_eq!(fs::read_to_string(&path).unwrap(), "three\n");
    }

    /// End-to-end test: programmatic trigger of the signaled policy
    #[tokio::test]
    async fn test_e2e_signaled_trigger() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("foo.out");
        let moved = dir.path().join("foo.out.old");

        let config = RelayConfig::new(&path).with_rotation(RotationConfig::Signaled {
            signal: "USR1".into(),
        });
        let relay = create_relay(&config).unwrap();
        let trigger = relay.policy().trigger().unwrap();
        assert!(matches!(relay.policy(), Policy::Signaled(_)));

        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(relay.run(rx));

        send_lines(&tx, numbered("x", 2)).await;
        wait_for_lines(&path, 2).await;
        fs::rename(&path, &moved).unwrap();

        trigger.fire();
        for _ in 0..400 {
            if path.exists() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        send_lines(&tx, numbered("y", 3)).await;
        drop(tx);

        let stats = task.await.unwrap().unwrap();
        assert_eq!(stats.rotations, 1);
        assert_eq!(fs::read_to_string(&moved).unwrap().lines().count(), 2);
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 3);
    }

    /// End-to-end test: size threshold with a two-file backup chain
    ///
    /// 每行 5 字节 (含换行)，10 字节触发轮转，保留 2 个备份。
    #[tokio::test]
    async fn test_e2e_sizecount_chain() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("foo.out");

        let config = RelayConfig::new(&path).with_rotation(RotationConfig::SizeCount {
            size: Some("10".into()),
            count: Some(2),
        });
        let relay = create_relay(&config).unwrap();

        let (tx, rx) = mpsc::channel(16);
        send_lines(&tx, (1..=7).map(|i| format!("lin{i}"))).await;
        drop(tx);

        let stats = relay.run(rx).await.unwrap();
        assert_eq!(stats.lines, 7);
        assert_eq!(stats.rotations, 3);
        assert_eq!(stats.tally.count("sizecount", "size_exceeded"), 3);

        assert_eq!(fs::read_to_string(&path).unwrap(), "lin7\n");
        assert_eq!(fs::read_to_string(backup_path(&path, 1)).unwrap(), "lin5\nlin6\n");
        assert_eq!(fs::read_to_string(backup_path(&path, 2)).unwrap(), "lin3\nlin4\n");
        assert!(!backup_path(&path, 3).exists());
    }

    /// End-to-end test: `count = 0` falls back to the default backup count
    ///
    /// 每一行都必须保留在磁盘上。
    #[tokio::test]
    async fn test_e2e_sizecount_zero_count_keeps_lines() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("foo.out");

        let config = RelayConfig::new(&path).with_rotation(RotationConfig::SizeCount {
            size: Some("4".into()),
            count: Some(0),
        });
        let relay = create_relay(&config).unwrap();

        let (tx, rx) = mpsc::channel(4);
        send_lines(&tx, ["aaaa", "bbbb", "cc"].map(String::from)).await;
        drop(tx);

        let stats = relay.run(rx).await.unwrap();
        assert_eq!(stats.lines, 3);
        assert_eq!(stats.rotations, 2);

        let mut on_disk = String::new();
        for file in [backup_path(&path, 2), backup_path(&path, 1), path.clone()] {
            on_disk.push_str(&fs::read_to_string(file).unwrap());
        }
        assert_eq!(on_disk, "aaaa\nbbbb\ncc\n");
    }

    /// End-to-end test: input bytes → reader thread → relay → file, both read modes
    #[tokio::test]
    async fn test_e2e_buffered_and_unbuffered_agree() {
        let input: String = (0..1000).map(|i| format!("entry {i}\n")).collect();
        let mut outputs = Vec::new();

        for mode in [ReadMode::Buffered, ReadMode::Unbuffered] {
            let dir = tempdir().unwrap();
            let path = dir.path().join("foo.out");

            let relay = create_relay(&RelayConfig::new(&path)).unwrap();
            let source = LineSource::new(Cursor::new(input.clone()), ReaderConfig::default());
            let (rx, _reader) = spawn_reader(source, mode, 64).unwrap();

            let stats = relay.run(rx).await.unwrap();
            assert_eq!(stats.lines, 1000);
            outputs.push(fs::read_to_string(&path).unwrap());
        }

        assert_eq!(outputs[0], input);
        assert_eq!(outputs[0], outputs[1]);
    }

    /// Invalid signal from a config file fails before the output is created
    #[tokio::test]
    async fn test_e2e_invalid_signal_from_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("foo.out");
        let content = format!(
            "path = {:?}\n[rotation]\nmode = \"signaled\"\nsignal = \"JSLFJKSFJ\"\n",
            path.display().to_string()
        );

        let err = ConfigLoader::load_from_str(&content, ConfigFormat::Toml).unwrap_err();
        assert!(err.is_config());

        // Bypassing the loader still fails at construction.
        let config = RelayConfig::new(&path).with_rotation(RotationConfig::Signaled {
            signal: "JSLFJKSFJ".into(),
        });
        let err = create_relay(&config).err().unwrap();
        assert!(err.is_config());
        assert!(!path.exists());
    }

    /// A reopen that cannot open the target stops the relay with the error
    #[tokio::test]
    async fn test_e2e_reopen_failure_is_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("foo.out");
        let moved = dir.path().join("foo.out.moved");

        let relay = create_relay(&RelayConfig::new(&path)).unwrap();
        let (tx, rx) = mpsc::channel(8);
        let task = tokio::spawn(relay.run(rx));

        send_lines(&tx, numbered("first", 2)).await;
        wait_for_lines(&path, 2).await;
        fs::rename(&path, &moved).unwrap();
        // A directory now occupies the target path.
        fs::create_dir(&path).unwrap();

        send_lines(&tx, numbered("lost", 1)).await;
        drop(tx);

        let err = task.await.unwrap().unwrap_err();
        assert!(matches!(err, RelayError::Contract(_)));
        assert!(!err.is_config());
        assert_eq!(fs::read_to_string(&moved).unwrap(), joined(&numbered("first", 2)));
    }
}

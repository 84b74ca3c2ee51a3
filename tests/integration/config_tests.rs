use bytedupe::config::Config;
use bytedupe::duplicates::{DuplicateFinder, FinderConfig};
use bytedupe::scanner::GrouperConfig;
use figment::providers::{Format, Serialized, Toml};
use figment::Figment;
use std::fs;
use tempfile::tempdir;

#[test]
fn test_config_load_defaults() {
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.io_threads, 4);
}

#[test]
fn test_config_load_from_env() {
    figment::Jail::expect_with(|jail| {
        jail.set_env("BYTEDUPE_IO_THREADS", "16");
        jail.set_env("BYTEDUPE_SHOW_LENGTHS", "false");

        let config: Config = Config::figment(None).extract()?;

        assert_eq!(config.io_threads, 16);
        assert!(!config.show_lengths);
        Ok(())
    });
}

#[test]
fn test_config_drives_finder() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");
    fs::write(
        &config_path,
        "io_threads = 1\nskip_hidden = true\nignore_patterns = [\"*.log\"]\n",
    )
    .unwrap();

    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .merge(Toml::file(&config_path))
        .extract()
        .unwrap();

    let data = temp_dir.path().join("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("one.txt"), "same").unwrap();
    fs::write(data.join("two.txt"), "same").unwrap();
    fs::write(data.join("three.log"), "same").unwrap();
    fs::write(data.join(".four"), "same").unwrap();

    let finder = DuplicateFinder::new(
        FinderConfig::default()
            .with_io_threads(config.io_threads)
            .with_grouper_config(GrouperConfig::new(
                config.skip_hidden,
                config.ignore_patterns.clone(),
            )),
    );
    let (groups, _) = finder.find_duplicates(&data).unwrap();

    assert_eq!(finder.config().io_threads, 1);
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].len(), 2);
}

#[test]
fn test_config_save_toml() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("config.toml");

    let config = Config {
        io_threads: 2,
        show_lengths: false,
        ignore_patterns: vec!["node_modules/".to_string()],
        ..Config::default()
    };
    config.save_to(&config_path).unwrap();

    let saved_content = fs::read_to_string(&config_path).unwrap();
    assert!(saved_content.contains("io_threads = 2"));
    assert!(saved_content.contains("show_lengths = false"));
    assert!(saved_content.contains("node_modules/"));
}

//! The `sortpix tag` and `sortpix skip` commands.
//!
//! Both edit the JSON override files in place. Entries are keyed by file
//! name, so a path argument is reduced to its final component.

use std::path::Path;

use clap::Args;
use sortpix_core::overrides;
use sortpix_core::Config;

/// Arguments for the `tag` command.
#[derive(Args, Debug)]
pub struct TagArgs {
    /// Image file name (or a path to it)
    pub image: String,

    /// Tags to record; replaces any existing manual tags
    #[arg(required_unless_present = "clear", conflicts_with = "clear")]
    pub tags: Vec<String>,

    /// Remove the manual tags for the image
    #[arg(long)]
    pub clear: bool,
}

/// Arguments for the `skip` command.
#[derive(Args, Debug)]
pub struct SkipArgs {
    /// Image file name (or a path to it)
    pub image: String,

    /// Take the image off the skip list instead
    #[arg(long)]
    pub remove: bool,
}

/// Execute the tag command.
pub fn execute_tag(config: &Config, args: TagArgs) -> anyhow::Result<()> {
    let path = config.manual_tags();
    let name = image_name(&args.image)?;

    if args.clear {
        if overrides::remove_manual_tags(&path, &name)? {
            println!("Cleared manual tags for {name}");
        } else {
            println!("{name} had no manual tags");
        }
        return Ok(());
    }

    let tags = normalize_tags(args.tags);
    println!("{name}: {}", tags.join(", "));
    overrides::set_manual_tags(&path, &name, tags)?;
    tracing::info!("Updated {:?}", path);
    Ok(())
}

/// Execute the skip command.
pub fn execute_skip(config: &Config, args: SkipArgs) -> anyhow::Result<()> {
    let path = config.skip_list();
    let name = image_name(&args.image)?;

    if args.remove {
        if overrides::remove_skip(&path, &name)? {
            println!("{name} will be tagged again");
        } else {
            println!("{name} was not on the skip list");
        }
    } else if overrides::add_skip(&path, &name)? {
        println!("{name} will be skipped");
    } else {
        println!("{name} is already on the skip list");
    }
    Ok(())
}

fn image_name(arg: &str) -> anyhow::Result<String> {
    Path::new(arg)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .ok_or_else(|| anyhow::anyhow!("Not an image file name: {arg:?}"))
}

/// Trim, drop empties and duplicates, keep first-seen order.
fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use sortpix_core::OverrideStore;

    fn config_in(dir: &Path) -> Config {
        let mut config = Config::default();
        config.paths.skip_list = dir.join("SkipImages.json");
        config.paths.manual_tags = dir.join("ManualTag.json");
        config
    }

    #[test]
    fn test_image_name_strips_directories() {
        assert_eq!(image_name("photos/2024/cat.jpg").unwrap(), "cat.jpg");
        assert_eq!(image_name("cat.jpg").unwrap(), "cat.jpg");
        assert!(image_name("..").is_err());
    }

    #[test]
    fn test_normalize_tags() {
        let tags = vec![" dog ".into(), "".into(), "cat".into(), "dog".into()];
        assert_eq!(normalize_tags(tags), vec!["dog", "cat"]);
    }

    #[test]
    fn test_tag_then_clear() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());

        execute_tag(
            &config,
            TagArgs {
                image: "shots/a.jpg".into(),
                tags: vec!["dog".into(), "ball".into()],
                clear: false,
            },
        )
        .unwrap();
        let store = OverrideStore::load(&config.skip_list(), &config.manual_tags());
        assert_eq!(
            store.manual_tags_for("a.jpg"),
            Some(&["dog".to_string(), "ball".to_string()][..])
        );

        execute_tag(
            &config,
            TagArgs {
                image: "a.jpg".into(),
                tags: Vec::new(),
                clear: true,
            },
        )
        .unwrap();
        let store = OverrideStore::load(&config.skip_list(), &config.manual_tags());
        assert!(store.manual_tags_for("a.jpg").is_none());
    }

    #[test]
    fn test_skip_and_unskip() {
        let dir = tempfile::tempdir().unwrap();
        let config = config_in(dir.path());
        let skip = |remove| SkipArgs {
            image: "b.png".into(),
            remove,
        };

        execute_skip(&config, skip(false)).unwrap();
        execute_skip(&config, skip(false)).unwrap();
        let store = OverrideStore::load(&config.skip_list(), &config.manual_tags());
        assert!(store.is_skipped("b.png"));
        assert_eq!(store.skipped_count(), 1);

        execute_skip(&config, skip(true)).unwrap();
        let store = OverrideStore::load(&config.skip_list(), &config.manual_tags());
        assert!(!store.is_skipped("b.png"));
    }
}

use sea_orm_migration::MigratorTrait;
use std::collections::HashSet;

/// Every migration must have a unique `mYYYYMMDD_HHMMSS_description` name.
#[test]
fn migration_names_are_unique_and_well_formed() {
    use image_cache::database::migrations::Migrator;

    let mut seen = HashSet::new();
    for migration in Migrator::migrations() {
        let name = migration.name().to_string();
        assert!(is_valid_migration_name(&name), "malformed migration name: {name}");
        assert!(seen.insert(name.clone()), "duplicate migration name: {name}");
    }
    assert!(!seen.is_empty());
}

fn is_valid_migration_name(name: &str) -> bool {
    let Some(rest) = name.strip_prefix('m') else {
        return false;
    };
    let mut parts = rest.splitn(3, '_');
    let (Some(date), Some(time), Some(description)) = (parts.next(), parts.next(), parts.next())
    else {
        return false;
    };

    date.len() == 8
        && date.chars().all(|c| c.is_ascii_digit())
        && time.len() == 6
        && time.chars().all(|c| c.is_ascii_digit())
        && !description.is_empty()
        && description
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

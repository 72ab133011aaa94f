//! Tests for show catalog loading and random show draws

#[cfg(test)]
mod tests {
    use crate::catalog::*;
    use crate::error::EpgError;
    use crate::models::Vocabulary;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::io::Write;

    fn line(lang: &str, genre: &str, title: &str, duration: u32) -> String {
        let duration = duration.to_string();
        [
            lang,
            genre,
            title,
            "",
            "A description",
            "",
            "",
            "",
            "",
            "",
            "Some Director",
            "Actor A, Actor B",
            "",
            duration.as_str(),
        ]
        .join(";")
    }

    fn langs(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_load_counts_every_supported_line() {
        let content = [
            line("en", "movie", "Movie 1", 90),
            line("en", "movie", "Movie 2", 60),
            line("fa", "movie", "فیلم ۱", 90),
            line("en", "news", "Headlines", 30),
            line("fa", "documentary", "مستند", 45),
        ]
        .join("\n");

        let catalog = ShowCatalog::parse(&content, Vocabulary::default()).unwrap();

        assert_eq!(catalog.record_count(), 5);
        assert_eq!(catalog.bucket("en", "movie").len(), 2);
        assert_eq!(catalog.bucket("fa", "movie").len(), 1);
        assert_eq!(catalog.bucket("en", "news").len(), 1);
        assert_eq!(catalog.bucket("fa", "documentary").len(), 1);
        assert!(catalog.bucket("en", "sport").is_empty());
        assert!(catalog.skipped().is_empty());

        // file order is kept inside a bucket
        assert_eq!(catalog.bucket("en", "movie")[0].fields.title, "Movie 1");
        assert_eq!(catalog.bucket("en", "movie")[1].fields.title, "Movie 2");
        assert_eq!(catalog.bucket("en", "movie")[1].duration_minutes, 60);
    }

    #[test]
    fn test_fields_are_mapped_in_order() {
        let content =
            "en;movie;Title;Sub;Desc;PG;3/5;0.1.;Drama;http://x/icon.png;Dir;Act;http://x/;95\n";
        let catalog = ShowCatalog::parse(content, Vocabulary::default()).unwrap();

        let record = &catalog.bucket("en", "movie")[0];
        assert_eq!(record.fields.title, "Title");
        assert_eq!(record.fields.sub_title, "Sub");
        assert_eq!(record.fields.description, "Desc");
        assert_eq!(record.fields.rating, "PG");
        assert_eq!(record.fields.star_rating, "3/5");
        assert_eq!(record.fields.episode_num, "0.1.");
        assert_eq!(record.fields.categories, "Drama");
        assert_eq!(record.fields.icon, "http://x/icon.png");
        assert_eq!(record.fields.directors, "Dir");
        assert_eq!(record.fields.actors, "Act");
        assert_eq!(record.fields.url, "http://x/");
        assert_eq!(record.duration_minutes, 95);
    }

    #[test]
    fn test_short_line_fails_whole_load() {
        let mut content = vec![
            line("en", "movie", "Movie 1", 90),
            line("en", "movie", "Movie 2", 60),
        ];
        // 13 fields
        content.push("en;movie;Broken;;;;;;;;;;90".to_string());
        content.push(line("en", "movie", "Movie 3", 60));

        let result = ShowCatalog::parse(&content.join("\n"), Vocabulary::default());
        match result {
            Err(EpgError::MalformedRecord { line, found }) => {
                assert_eq!(line, 3);
                assert_eq!(found, 13);
            }
            other => panic!("expected MalformedRecord, got {other:?}"),
        }
    }

    #[test]
    fn test_long_line_fails_whole_load() {
        let content = format!("{};extra", line("en", "movie", "Movie 1", 90));
        assert!(matches!(
            ShowCatalog::parse(&content, Vocabulary::default()),
            Err(EpgError::MalformedRecord { found: 15, .. })
        ));
    }

    #[test]
    fn test_unsupported_language_is_skipped() {
        let content = [line("de", "movie", "Der Film", 90), line("en", "movie", "The Film", 90)]
            .join("\n");

        let catalog = ShowCatalog::parse(&content, Vocabulary::default()).unwrap();

        assert_eq!(catalog.record_count(), 1);
        assert_eq!(catalog.bucket("en", "movie")[0].fields.title, "The Film");
        assert!(catalog.bucket("de", "movie").is_empty());

        let skipped = catalog.skipped();
        assert_eq!(skipped.len(), 1);
        assert_eq!(skipped[0].line, 1);
        assert_eq!(skipped[0].language, "de");
        assert_eq!(skipped[0].genre, "movie");
    }

    #[test]
    fn test_unsupported_genre_is_skipped() {
        let content = [line("en", "weather", "Forecast", 10), line("en", "news", "Headlines", 30)]
            .join("\n");

        let catalog = ShowCatalog::parse(&content, Vocabulary::default()).unwrap();
        assert_eq!(catalog.record_count(), 1);
        assert_eq!(catalog.skipped()[0].genre, "weather");
    }

    #[test]
    fn test_custom_vocabulary() {
        let mut vocabulary = Vocabulary::default();
        vocabulary.languages.insert("de".to_string());

        let content = line("de", "movie", "Der Film", 90);
        let catalog = ShowCatalog::parse(&content, vocabulary).unwrap();
        assert_eq!(catalog.bucket("de", "movie").len(), 1);
    }

    #[test]
    fn test_bad_duration_fails_load() {
        let content = "en;movie;Title;;;;;;;;;;;ninety\n";
        assert!(matches!(
            ShowCatalog::parse(content, Vocabulary::default()),
            Err(EpgError::InvalidDuration { line: 1, .. })
        ));

        let content = "en;movie;Title;;;;;;;;;;;0\n";
        assert!(matches!(
            ShowCatalog::parse(content, Vocabulary::default()),
            Err(EpgError::InvalidDuration { .. })
        ));
    }

    #[test]
    fn test_blank_title_fails_load() {
        let content = ["en;movie;;;;;;;;;;;;60", "en;movie;Real;;;;;;;;;;;60"].join("\n");
        assert!(matches!(
            ShowCatalog::parse(&content, Vocabulary::default()),
            Err(EpgError::MissingTitle { line: 1 })
        ));

        let content = [line("en", "movie", "Real", 60), line("en", "movie", "   ", 60)].join("\n");
        assert!(matches!(
            ShowCatalog::parse(&content, Vocabulary::default()),
            Err(EpgError::MissingTitle { line: 2 })
        ));
    }

    #[test]
    fn test_blank_title_on_skipped_line_is_ignored() {
        let content = ["de;movie;;;;;;;;;;;;60", "en;movie;Real;;;;;;;;;;;60"].join("\n");
        let catalog = ShowCatalog::parse(&content, Vocabulary::default()).unwrap();
        assert_eq!(catalog.record_count(), 1);
        assert_eq!(catalog.skipped().len(), 1);
    }

    #[test]
    fn test_crlf_and_blank_lines() {
        let content = format!(
            "{}\r\n\r\n{}\r\n",
            line("en", "movie", "Movie 1", 90),
            line("en", "movie", "Movie 2", 60)
        );
        let catalog = ShowCatalog::parse(&content, Vocabulary::default()).unwrap();
        assert_eq!(catalog.record_count(), 2);
        assert_eq!(catalog.bucket("en", "movie")[0].duration_minutes, 90);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{}", line("en", "cartoon", "Toons", 25)).unwrap();
        writeln!(file, "{}", line("fa", "cartoon", "کارتون", 25)).unwrap();

        let catalog = ShowCatalog::load(file.path(), Vocabulary::default()).unwrap();
        assert_eq!(catalog.record_count(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let result = ShowCatalog::load(
            std::path::Path::new("/definitely/not/here.csv"),
            Vocabulary::default(),
        );
        assert!(matches!(result, Err(EpgError::Io(_))));
    }

    fn parallel_catalog(count: usize) -> ShowCatalog {
        let mut lines = Vec::new();
        for i in 0..count {
            lines.push(line("en", "movie", &format!("en-{i}"), 30 + i as u32));
            lines.push(line("fa", "movie", &format!("fa-{i}"), 200));
        }
        ShowCatalog::parse(&lines.join("\n"), Vocabulary::default()).unwrap()
    }

    #[test]
    fn test_draw_uses_same_index_for_every_language() {
        let catalog = parallel_catalog(5);
        let mut rng = StdRng::seed_from_u64(7);

        for _ in 0..100 {
            let show = catalog
                .draw_random_show(&mut rng, &langs(&["en", "fa"]), "movie")
                .unwrap();
            let en = show.fields_for("en").unwrap();
            let fa = show.fields_for("fa").unwrap();

            assert_eq!(en.title, format!("en-{}", show.index));
            assert_eq!(fa.title, format!("fa-{}", show.index));
            // running time comes from the first language
            assert_eq!(show.duration_minutes, 30 + show.index as u32);
            assert_eq!(show.primary_title(), en.title);
        }
    }

    #[test]
    fn test_draw_order_follows_requested_languages() {
        let catalog = parallel_catalog(3);
        let mut rng = StdRng::seed_from_u64(1);

        let show = catalog
            .draw_random_show(&mut rng, &langs(&["fa", "en"]), "movie")
            .unwrap();
        assert_eq!(show.metadata[0].0, "fa");
        assert_eq!(show.metadata[1].0, "en");
        assert_eq!(show.duration_minutes, 200);
        assert!(show.primary_title().starts_with("fa-"));
    }

    #[test]
    fn test_draw_is_reproducible_with_seed() {
        let catalog = parallel_catalog(10);
        let languages = langs(&["en"]);

        let draw = |seed| {
            let mut rng = StdRng::seed_from_u64(seed);
            (0..20)
                .map(|_| catalog.draw_random_show(&mut rng, &languages, "movie").unwrap().index)
                .collect::<Vec<_>>()
        };

        assert_eq!(draw(42), draw(42));
    }

    #[test]
    fn test_unequal_buckets_wrap_around() {
        let content = [
            line("en", "news", "en-0", 30),
            line("en", "news", "en-1", 30),
            line("en", "news", "en-2", 30),
            line("en", "news", "en-3", 30),
            line("fa", "news", "fa-0", 30),
            line("fa", "news", "fa-1", 30),
        ]
        .join("\n");
        let catalog = ShowCatalog::parse(&content, Vocabulary::default()).unwrap();
        let mut rng = StdRng::seed_from_u64(3);

        let mut seen = std::collections::HashSet::new();
        for _ in 0..200 {
            let show = catalog
                .draw_random_show(&mut rng, &langs(&["fa", "en"]), "news")
                .unwrap();
            assert!(show.index < 4);
            assert_eq!(show.fields_for("fa").unwrap().title, format!("fa-{}", show.index % 2));
            assert_eq!(show.fields_for("en").unwrap().title, format!("en-{}", show.index));
            seen.insert(show.index);
        }
        // the longest bucket decides the index range
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn test_draw_from_empty_bucket_fails() {
        let catalog = parallel_catalog(2);
        let mut rng = StdRng::seed_from_u64(0);

        match catalog.draw_random_show(&mut rng, &langs(&["en"]), "sport") {
            Err(EpgError::EmptyBucket { language, genre }) => {
                assert_eq!(language, "en");
                assert_eq!(genre, "sport");
            }
            other => panic!("expected EmptyBucket, got {other:?}"),
        }
    }

    #[test]
    fn test_draw_rejects_unsupported_input() {
        let catalog = parallel_catalog(2);
        let mut rng = StdRng::seed_from_u64(0);

        assert!(matches!(
            catalog.draw_random_show(&mut rng, &langs(&["en", "de"]), "movie"),
            Err(EpgError::UnsupportedLanguage(lang)) if lang == "de"
        ));
        assert!(matches!(
            catalog.draw_random_show(&mut rng, &langs(&["en"]), "weather"),
            Err(EpgError::UnsupportedGenre(genre)) if genre == "weather"
        ));
        assert!(matches!(
            catalog.draw_random_show(&mut rng, &[], "movie"),
            Err(EpgError::NoLanguages)
        ));
    }

    #[test]
    fn test_duration_field_excluded_from_metadata() {
        let catalog = parallel_catalog(1);
        let mut rng = StdRng::seed_from_u64(0);

        let show = catalog.draw_random_show(&mut rng, &langs(&["en"]), "movie").unwrap();
        let fields = show.fields_for("en").unwrap();
        assert_eq!(fields.description, "A description");
        assert_eq!(fields.actors, "Actor A, Actor B");
        assert_eq!(show.duration_minutes, 30);
    }
}

#[cfg(test)]
mod tests {
    use crate::catalog::{
        CatalogDecoder, CategoryDecoder, CategoryRecord, DecodedFile, PositionDecoder,
        PositionRecord, decode_categories, decode_positions,
    };
    use crate::encoding::decode_cp437;

    // ========================================================================
    // Category decoder
    // ========================================================================

    #[test]
    fn test_two_category_blocks_with_parent() {
        let text = "000G=guid-1\n000N=Dach\n001G=guid-2\n001N=Fenster\n001P=000\n";
        let records = decode_categories("Dach.lst", text);

        assert_eq!(
            records,
            vec![
                CategoryRecord {
                    sort_order: 0,
                    source_guid: Some("guid-1".to_string()),
                    name: "Dach".to_string(),
                    parent_guid: None,
                    source_file: "Dach.lst".to_string(),
                },
                CategoryRecord {
                    sort_order: 1,
                    source_guid: Some("guid-2".to_string()),
                    name: "Fenster".to_string(),
                    parent_guid: Some("guid-1".to_string()),
                    source_file: "Dach.lst".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_field_order_within_block_does_not_matter() {
        let forward = decode_categories("a.lst", "004G = g4\n004N = Rinne\n");
        let reversed = decode_categories("a.lst", "004N = Rinne\n004G = g4\n");

        assert_eq!(forward, reversed);
        assert_eq!(forward.len(), 1);
        assert_eq!(forward[0].source_guid.as_deref(), Some("g4"));
        assert_eq!(forward[0].name, "Rinne");
        assert_eq!(forward[0].sort_order, 4);
    }

    #[test]
    fn test_record_without_name_is_dropped() {
        assert!(decode_categories("a.lst", "001P = 5").is_empty());

        let records = decode_categories("a.lst", "001G = g1\n002G = g2\n002N = Blech\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Blech");
    }

    #[test]
    fn test_parent_resolution_by_index() {
        let text = "001G = A\n001N = Dach\n002G = B\n002N = Ziegel\n002P = 1\n";
        let records = decode_categories("a.lst", text);

        let b = records
            .iter()
            .find(|r| r.source_guid.as_deref() == Some("B"))
            .unwrap();
        assert_eq!(b.parent_guid.as_deref(), Some("A"));
    }

    #[test]
    fn test_dangling_parent_is_dropped() {
        let text = "001G = A\n001N = Dach\n002G = B\n002N = Ziegel\n002P = 9\n";
        let records = decode_categories("a.lst", text);

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].parent_guid, None);
    }

    #[test]
    fn test_parent_without_guid_is_not_resolved() {
        // index 001 has a name but no GUID, so nothing can point at it
        let text = "001N = Dach\n002G = B\n002N = Ziegel\n002P = 1\n";
        let records = decode_categories("a.lst", text);

        assert_eq!(records.len(), 2);
        assert_eq!(records[1].parent_guid, None);
    }

    #[test]
    fn test_parent_pointing_at_dropped_record() {
        // index 001 is dropped for lack of a name, so its GUID is not resolvable
        let text = "001G = A\n002G = B\n002N = Ziegel\n002P = 1\n";
        let records = decode_categories("a.lst", text);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].parent_guid, None);
    }

    #[test]
    fn test_unmapped_e_code_is_inert() {
        let text = "003G = g3\n003E = 17\n003N = Kamin\n";
        let records = decode_categories("a.lst", text);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Kamin");
        assert_eq!(records[0].source_guid.as_deref(), Some("g3"));
    }

    #[test]
    fn test_malformed_lines_keep_accumulation() {
        let text = "[Liste]\n005G = g5\nirgendwas\n\n005N = Gaube\n";
        let records = decode_categories("a.lst", text);

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].source_guid.as_deref(), Some("g5"));
        assert_eq!(records[0].name, "Gaube");
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = "000G = g0\r\n000N = Dach\r\n001G = g1\r\n001N = First\r\n001P = 0\r\n";
        let records = decode_categories("a.lst", text);

        assert_eq!(records[0].name, "Dach");
        assert_eq!(records[1].parent_guid.as_deref(), Some("g0"));
    }

    #[test]
    fn test_empty_category_file() {
        assert!(decode_categories("a.lst", "").is_empty());
    }

    #[test]
    fn test_category_from_cp437_bytes() {
        let text = decode_cp437(b"000G = g0\r\n000N = Fl\x84chen \x9Aberdeckung\r\n");
        let records = decode_categories("a.lst", &text);
        assert_eq!(records[0].name, "Flächen Überdeckung");
    }

    // ========================================================================
    // Position decoder
    // ========================================================================

    #[test]
    fn test_end_to_end_position() {
        let text = "@Pdachziegel\n12,5\n@TLangtext Zeile1\nZeile2\n@MStk";
        let records = decode_positions("Dach.pos", text);

        assert_eq!(records.len(), 1);
        let pos = &records[0];
        assert_eq!(pos.name, "dachziegel");
        assert_eq!(pos.price_value1, Some(12.5));
        assert_eq!(pos.price_value2, None);
        assert_eq!(pos.long_text.as_deref(), Some("Langtext Zeile1\nZeile2"));
        assert_eq!(pos.unit.as_deref(), Some("Stk"));
        assert_eq!(pos.source_file, "Dach.pos");
    }

    #[test]
    fn test_long_text_over_three_lines() {
        let text = "@P Traufblech\n@T\n  Traufblech aus Titanzink\nliefern und\nmontieren.  \n@M m\n";
        let records = decode_positions("a.pos", text);

        assert_eq!(
            records[0].long_text.as_deref(),
            Some("Traufblech aus Titanzink\nliefern und\nmontieren.")
        );
        assert_eq!(records[0].unit.as_deref(), Some("m"));
    }

    #[test]
    fn test_leading_values() {
        let text = "@P Lattung\n12,50\n3\n@M m²\n";
        let pos = &decode_positions("a.pos", text)[0];

        assert_eq!(pos.price_value1, Some(12.5));
        assert_eq!(pos.price_value2, Some(3.0));
    }

    #[test]
    fn test_third_leading_value_ignored() {
        let text = "@P Lattung\n1,5\n2\n99\n@M m\n";
        let pos = &decode_positions("a.pos", text)[0];

        assert_eq!(pos.price_value1, Some(1.5));
        assert_eq!(pos.price_value2, Some(2.0));
    }

    #[test]
    fn test_non_numeric_leading_lines_ignored() {
        let text = "@P Lattung\nca. 12\n0.75\n@M m\n";
        let pos = &decode_positions("a.pos", text)[0];

        assert_eq!(pos.price_value1, Some(0.75));
        assert_eq!(pos.price_value2, None);
    }

    #[test]
    fn test_numbers_after_tag_are_not_prices() {
        let text = "@P Lattung\n@M m\n12,5\n";
        let pos = &decode_positions("a.pos", text)[0];
        assert_eq!(pos.price_value1, None);
    }

    #[test]
    fn test_short_text_closed_by_unit() {
        let text = "@P Kehle\n@R Kehle\neinbauen\n@M lfm\n";
        let pos = &decode_positions("a.pos", text)[0];

        assert_eq!(pos.short_text.as_deref(), Some("Kehle\neinbauen"));
        assert_eq!(pos.unit.as_deref(), Some("lfm"));
    }

    #[test]
    fn test_all_single_line_fields() {
        let text = "@P First\n@C cat-guid\n@D 4711\n@E 03\n@H Kopf\n";
        let pos = &decode_positions("a.pos", text)[0];

        assert_eq!(pos.category_guid.as_deref(), Some("cat-guid"));
        assert_eq!(pos.source_id.as_deref(), Some("4711"));
        assert_eq!(pos.unit_code.as_deref(), Some("03"));
        assert_eq!(pos.unit, None);
    }

    #[test]
    fn test_description_then_long_text() {
        let text = "@P Gaube\n@B Beschreibung\n@T Langtext\n@E 1\n";
        let pos = &decode_positions("a.pos", text)[0];

        assert_eq!(pos.description.as_deref(), Some("Beschreibung"));
        assert_eq!(pos.long_text.as_deref(), Some("Langtext"));
        assert_eq!(pos.unit_code.as_deref(), Some("1"));
    }

    #[test]
    fn test_long_text_closed_by_description() {
        let text = "@P Gaube\n@T\nLang\n@B\nBeschr\n";
        let pos = &decode_positions("a.pos", text)[0];

        assert_eq!(pos.long_text.as_deref(), Some("Lang"));
        assert_eq!(pos.description.as_deref(), Some("Beschr"));
    }

    #[test]
    fn test_open_field_flushed_at_record_start_and_end() {
        let text = "@P Eins\n@R kurz eins\n@P Zwei\n@B\nBeschreibung zwei\n";
        let records = decode_positions("a.pos", text);

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].short_text.as_deref(), Some("kurz eins"));
        assert_eq!(records[1].description.as_deref(), Some("Beschreibung zwei"));
    }

    #[test]
    fn test_meta_tags_stop_accumulation() {
        let text = "@P Eins\n@T\nTeil A\n@K Kalkulation\nnicht Teil\n@M Std\n";
        let pos = &decode_positions("a.pos", text)[0];

        // the meta tag discards the open long text without writing it
        assert_eq!(pos.long_text, None);
        assert_eq!(pos.unit.as_deref(), Some("Std"));
    }

    #[test]
    fn test_attribute_value_line_not_parsed() {
        let text = "@P Blech\n@A Materialstaerke\n0,7\n@M m\n";
        let pos = &decode_positions("a.pos", text)[0];

        assert_eq!(pos.price_value1, None);
        assert_eq!(pos.unit.as_deref(), Some("m"));
    }

    #[test]
    fn test_unit_code_discards_open_short_text() {
        let text = "@P Kehle\n@R kurz\n@E 03\n";
        let pos = &decode_positions("a.pos", text)[0];

        assert_eq!(pos.short_text, None);
        assert_eq!(pos.unit_code.as_deref(), Some("03"));
    }

    #[test]
    fn test_description_discards_open_short_text() {
        let text = "@P Kehle\n@R kurz\n@B beschr\n";
        let pos = &decode_positions("a.pos", text)[0];

        assert_eq!(pos.short_text, None);
        assert_eq!(pos.description.as_deref(), Some("beschr"));
    }

    #[test]
    fn test_unit_code_writes_open_long_text() {
        let text = "@P Kehle\n@T\nLang\n@E 03\n";
        let pos = &decode_positions("a.pos", text)[0];

        assert_eq!(pos.long_text.as_deref(), Some("Lang"));
        assert_eq!(pos.unit_code.as_deref(), Some("03"));
    }

    #[test]
    fn test_attribute_inside_long_text() {
        let text = "@P Blech\n@T\nZeile1\n@A Farbe\nrot\nZeile2\n@M m\n";
        let pos = &decode_positions("a.pos", text)[0];

        assert_eq!(pos.long_text.as_deref(), Some("Zeile1\nZeile2"));
        assert_eq!(pos.unit.as_deref(), Some("m"));
    }

    #[test]
    fn test_attribute_keeps_leading_values_open() {
        let text = "@P Blech\n12,5\n@A Materialstaerke\n0,7\n3\n@M m\n";
        let pos = &decode_positions("a.pos", text)[0];

        assert_eq!(pos.price_value1, Some(12.5));
        assert_eq!(pos.price_value2, Some(3.0));
    }

    #[test]
    fn test_attribute_followed_by_tag_skips_nothing_else() {
        let text = "@P Blech\n@A Farbe\n@T\nZeile1\n";
        let pos = &decode_positions("a.pos", text)[0];
        assert_eq!(pos.long_text.as_deref(), Some("Zeile1"));
    }

    #[test]
    fn test_unknown_tag_is_content() {
        let text = "@P Blech\n@T\n@Z zitiert\n@M m\n";
        let pos = &decode_positions("a.pos", text)[0];
        assert_eq!(pos.long_text.as_deref(), Some("@Z zitiert"));
    }

    #[test]
    fn test_lines_before_first_record_ignored() {
        let text = "@A Farbe\nrot\n@T Vorspann\n12\n@P Ziegel\n";
        let records = decode_positions("a.pos", text);

        assert_eq!(records, vec![PositionRecord::new("Ziegel", "a.pos")]);
    }

    #[test]
    fn test_position_without_fields() {
        let records = decode_positions("a.pos", "@P Nur Name");
        assert_eq!(records, vec![PositionRecord::new("Nur Name", "a.pos")]);
    }

    #[test]
    fn test_position_without_name_dropped() {
        let records = decode_positions("a.pos", "@P\n12\n@T Text\n@P Zweite\n");
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Zweite");
    }

    #[test]
    fn test_crlf_content_lines() {
        let text = "@P Eins\r\n@T\r\nZeile 1\r\nZeile 2\r\n@M Stk\r\n";
        let pos = &decode_positions("a.pos", text)[0];

        assert_eq!(pos.long_text.as_deref(), Some("Zeile 1\nZeile 2"));
        assert_eq!(pos.unit.as_deref(), Some("Stk"));
    }

    #[test]
    fn test_inner_indentation_preserved() {
        let text = "@P Eins\n@T\nListe:\n  - Punkt\n@M Stk\n";
        let pos = &decode_positions("a.pos", text)[0];
        assert_eq!(pos.long_text.as_deref(), Some("Liste:\n  - Punkt"));
    }

    #[test]
    fn test_empty_position_file() {
        assert!(decode_positions("a.pos", "").is_empty());
    }

    #[test]
    fn test_unit_label_lookup() {
        let pos = &decode_positions("a.pos", "@P Eins\n@M Stk\n")[0];
        assert_eq!(pos.unit_label(), Some("Stück"));
    }

    // ========================================================================
    // Trait dispatch and purity
    // ========================================================================

    #[test]
    fn test_decoding_is_idempotent() {
        let lst = "000G=g\n000N=Dach\n001G=h\n001N=Wand\n001P=0\n";
        let pos = "@P Eins\n1\n@T\nText\n@M m\n@P Zwei\n@C g\n";

        assert_eq!(
            CategoryDecoder.decode("a.lst", lst),
            CategoryDecoder.decode("a.lst", lst)
        );
        assert_eq!(
            PositionDecoder.decode("a.pos", pos),
            PositionDecoder.decode("a.pos", pos)
        );
    }

    #[test]
    fn test_decoded_file_len() {
        let decoded = PositionDecoder.decode("a.pos", "@P Eins\n@P Zwei\n");
        assert_eq!(decoded.len(), 2);
        assert!(!decoded.is_empty());
        assert!(matches!(decoded, DecodedFile::Positions(_)));

        assert!(CategoryDecoder.decode("a.lst", "").is_empty());
    }
}

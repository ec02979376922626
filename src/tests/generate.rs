use anyhow::Result;

use super::*;

fn stop_set(markers: &[&str]) -> Vec<String> {
    markers.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_generate_answer_end_to_end() -> Result<()> {
    let model = ScriptedModel::new("Hi there![|Human|]trailing");
    let params = GenerationParams::default()
        .stop_set(["[|Human|]"])
        .max_length(2048)
        .max_context_length_tokens(180)
        .seed(Some(11));

    let answer = generate_answer(&model, &CharTokenizer, "Hello", &params)?;
    assert_eq!(answer, "Hi there!");

    let calls = model.calls.borrow();
    assert_eq!(calls.len(), "Hi there![|Human|]".len());
    // Only the right-aligned window of the prompt reaches the model.
    assert_eq!(calls[0].0.len(), 180);
    assert!(CharTokenizer
        .decode(&calls[0].0)?
        .ends_with("\n[|Human|]Hello\n[|AI|]"));
    Ok(())
}

#[test]
fn test_generate_answer_prompt_too_long() {
    let model = ScriptedModel::new("unused");
    let params = GenerationParams::default().max_length(50);
    assert!(matches!(
        generate_answer(&model, &CharTokenizer, "Hello", &params),
        Err(GenerateError::PromptTooLong { max_length: 50, .. })
    ));
    assert!(model.calls.borrow().is_empty());
}

#[test]
fn test_generate_answer_invalid_params() {
    let model = ScriptedModel::new("unused");
    for params in [
        GenerationParams::default().sampling(SamplingConfig::new(0.0, 1.0, 30)),
        GenerationParams::default().sampling(SamplingConfig::new(1.0, 0.0, 30)),
        GenerationParams::default().sampling(SamplingConfig::new(1.0, 1.0, 0)),
        GenerationParams::default().max_length(0),
        GenerationParams::default().max_context_length_tokens(0),
    ] {
        assert!(matches!(
            generate_answer(&model, &CharTokenizer, "Hello", &params),
            Err(GenerateError::InvalidParameter(_))
        ));
    }
}

#[test]
fn test_generate_answer_propagates_model_error() {
    let model = ScriptedModel::new("abcdef").fail_at(3);
    let params = GenerationParams::default().max_length(2048);
    assert!(matches!(
        generate_answer(&model, &CharTokenizer, "Hello", &params),
        Err(GenerateError::Model(_))
    ));
}

#[test]
fn test_generate_answer_max_steps() -> Result<()> {
    let model = ScriptedModel::new("Sure, myopia is nearsightedness.");
    let params = GenerationParams::default()
        .max_length(2048)
        .max_steps(5);
    assert_eq!(generate_answer(&model, &CharTokenizer, "Hello", &params)?, "Sure,");
    Ok(())
}

#[test]
fn test_clean_answer() {
    let stops = stop_set(&["[|Human|]", "[|AI|]"]);
    assert_eq!(clean_answer("Hi there![|Human|]", &stops), "Hi there!");
    assert_eq!(clean_answer("Hi there!\n[|Human|]", &stops), "Hi there!");
    assert_eq!(clean_answer("[|AI|] Hi\n[|AI|]", &stops), "Hi");
    assert_eq!(clean_answer("\n[|Human|][|AI|]answer", &stops), "answer");
    assert_eq!(clean_answer("no markers ", &stops), "no markers");
    assert_eq!(clean_answer("[|Human|]", &stops), "");
    assert_eq!(clean_answer("unchanged", &[]), "unchanged");
}

#[test]
fn test_clean_answer_marker_fragments() {
    let stops = stop_set(&["[|Human|]", "[|AI|]"]);
    assert_eq!(clean_answer("|AI|]Hi", &stops), "Hi");
    assert_eq!(clean_answer("n|]\nok", &stops), "ok");
    assert_eq!(clean_answer("|] [|AI|] fine[|Human|]", &stops), "fine");
    // Too short to tell apart from an answer that starts with a bracket.
    assert_eq!(clean_answer("]Hi", &stops), "]Hi");
    assert_eq!(clean_answer("Hi |AI|]", &stops), "Hi |AI|]");
}

#[test]
fn test_stream_partial_text() -> Result<()> {
    let model = ScriptedModel::new("Yes\n[|Human|]");
    let generator = Generator::new(&model, CharTokenizer).params(
        GenerationParams::default()
            .max_length(2048)
            .seed(Some(1)),
    );
    let texts = generator
        .stream("Is water wet?", &[])?
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(texts.first().map(String::as_str), Some("Y"));
    assert_eq!(texts.last().map(String::as_str), Some("Yes\n[|Human|]"));
    Ok(())
}

#[test]
fn test_conversation_records_turns() -> Result<()> {
    let tpl = PromptTemplate::new("P", "[H]", "[A]");
    let params = GenerationParams::default()
        .stop_set(["[H]", "[A]"])
        .max_length(64)
        .max_context_length_tokens(64);

    let mut conv = Conversation::new();
    let first = ScriptedModel::new("one\n[H]");
    let generator = Generator::new(&first, CharTokenizer)
        .template(tpl.clone())
        .params(params.clone());
    assert_eq!(conv.ask(&generator, "q1")?, "one");
    assert_eq!(conv.history(), [ConversationTurn::new("q1", "one")]);

    let second = ScriptedModel::new("two\n[H]");
    let generator = Generator::new(&second, CharTokenizer)
        .template(tpl)
        .params(params);
    assert_eq!(conv.ask(&generator, "q2")?, "two");
    assert_eq!(conv.history().len(), 2);

    // The second prompt carried the first exchange.
    let prompt = CharTokenizer.decode(&second.calls.borrow()[0].0)?;
    assert_eq!(prompt, "P\n[H]q1\n[A]one\n[H]q2\n[A]");

    conv.clear();
    assert!(conv.history().is_empty());
    Ok(())
}

#[test]
fn test_conversation_skips_failed_turns() {
    let model = ScriptedModel::new("abc").fail_at(0);
    let generator = Generator::new(&model, CharTokenizer)
        .params(GenerationParams::default().max_length(2048));
    let mut conv = Conversation::new();
    assert!(conv.ask(&generator, "Hello").is_err());
    assert!(conv.history().is_empty());
}

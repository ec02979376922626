use anyhow::Result;

use super::*;

fn stops(markers: &[&str]) -> Vec<String> {
    markers.iter().map(|s| s.to_string()).collect()
}

fn greedy() -> SamplingConfig {
    SamplingConfig::new(1.0, 1.0, 1)
}

fn start<'a>(
    model: &'a ScriptedModel,
    stop_set: &'a [String],
    max_steps: usize,
) -> Result<Decode<'a, ScriptedModel, CharTokenizer>> {
    Ok(decode(
        CharTokenizer.encode("prompt")?,
        model,
        &CharTokenizer,
        &greedy(),
        stop_set,
        max_steps,
        SimpleSamplerResources::new_seedable(Some(0)),
    )?)
}

#[test]
fn test_yields_cumulative_text() -> Result<()> {
    let model = ScriptedModel::new("abc");
    let stop_set = stops(&["#"]);
    let texts = start(&model, &stop_set, 3)?.collect::<Result<Vec<_>, _>>()?;
    assert_eq!(texts, ["a", "ab", "abc"]);
    Ok(())
}

#[test]
fn test_stops_after_marker() -> Result<()> {
    // The marker is produced by the third token (n = 2).
    let model = ScriptedModel::new("ab#cdef");
    let stop_set = stops(&["#"]);
    let mut dec = start(&model, &stop_set, 100)?;
    let texts = dec.by_ref().collect::<Result<Vec<_>, _>>()?;
    assert_eq!(texts, ["a", "ab", "ab#"]);
    assert_eq!(dec.stop_reason(), Some(&StopReason::StopString("#".to_string())));
    assert!(dec.next().is_none());
    assert_eq!(model.calls.borrow().len(), 3);
    Ok(())
}

#[test]
fn test_multi_token_marker() -> Result<()> {
    let model = ScriptedModel::new("ok[|Human|]more");
    let stop_set = stops(&["[|Human|]", "[|AI|]"]);
    let texts = start(&model, &stop_set, 100)?.collect::<Result<Vec<_>, _>>()?;
    assert_eq!(texts.len(), "ok[|Human|]".len());
    assert_eq!(texts.last().map(String::as_str), Some("ok[|Human|]"));
    Ok(())
}

#[test]
fn test_max_steps_bound() -> Result<()> {
    let model = ScriptedModel::new("abcdefgh");
    let stop_set = stops(&["#"]);
    let mut dec = start(&model, &stop_set, 5)?;
    assert_eq!(dec.by_ref().count(), 5);
    assert_eq!(dec.stop_reason(), Some(&StopReason::MaxSteps));
    assert_eq!(dec.state().step_count(), 5);
    assert_eq!(CharTokenizer.decode(dec.state().token_ids())?, "abcde");

    let model = ScriptedModel::new("abc");
    assert_eq!(start(&model, &stop_set, 0)?.count(), 0);
    assert!(model.calls.borrow().is_empty());
    Ok(())
}

#[test]
fn test_incremental_model_calls() -> Result<()> {
    let model = ScriptedModel::new("xyz");
    let stop_set = stops(&["#"]);
    start(&model, &stop_set, 3)?.collect::<Result<Vec<_>, _>>()?;

    let calls = model.calls.borrow();
    let prompt = CharTokenizer.encode("prompt")?;
    assert_eq!(calls[0], (prompt, false));
    assert_eq!(calls[1], (vec!['x' as TID], true));
    assert_eq!(calls[2], (vec!['y' as TID], true));
    Ok(())
}

#[test]
fn test_model_error_ends_sequence() -> Result<()> {
    let model = ScriptedModel::new("abcdef").fail_at(2);
    let stop_set = stops(&["#"]);
    let mut dec = start(&model, &stop_set, 100)?;
    assert_eq!(dec.next().transpose()?.as_deref(), Some("a"));
    assert_eq!(dec.next().transpose()?.as_deref(), Some("ab"));
    assert!(matches!(dec.next(), Some(Err(GenerateError::Model(_)))));
    assert!(dec.next().is_none());
    assert_eq!(dec.stop_reason(), Some(&StopReason::Error));
    Ok(())
}

#[test]
fn test_sampling_failure_ends_sequence() -> Result<()> {
    let model = ScriptedModel::new("abcdef").degenerate_at(1);
    let stop_set = stops(&["#"]);
    let items = start(&model, &stop_set, 100)?.collect::<Vec<_>>();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0].as_deref().ok(), Some("a"));
    assert!(matches!(items[1], Err(GenerateError::SamplingFailure(_))));
    Ok(())
}

#[test]
fn test_cancel_midway() -> Result<()> {
    let model = ScriptedModel::new("abcdef");
    let stop_set = stops(&["#"]);
    let first_two = start(&model, &stop_set, 100)?
        .take(2)
        .collect::<Result<Vec<_>, _>>()?;
    assert_eq!(first_two, ["a", "ab"]);
    assert_eq!(model.calls.borrow().len(), 2);
    Ok(())
}

#[test]
fn test_rejects_bad_arguments() -> Result<()> {
    let model = ScriptedModel::new("abc");
    let stop_set = stops(&["#"]);
    let res = SimpleSamplerResources::new_seedable;

    let bad_temp = SamplingConfig::new(0.0, 1.0, 1);
    assert!(matches!(
        decode(vec![1], &model, &CharTokenizer, &bad_temp, &stop_set, 10, res(None)),
        Err(GenerateError::InvalidParameter(_))
    ));
    assert!(matches!(
        decode(vec![], &model, &CharTokenizer, &greedy(), &stop_set, 10, res(None)),
        Err(GenerateError::InvalidParameter(_))
    ));
    let empty_stop = stops(&[""]);
    assert!(matches!(
        decode(vec![1], &model, &CharTokenizer, &greedy(), &empty_stop, 10, res(None)),
        Err(GenerateError::InvalidParameter(_))
    ));
    assert!(model.calls.borrow().is_empty());
    Ok(())
}

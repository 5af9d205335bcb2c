//! Plans made from scanned files and their round trip through the assembler.

mod common;

use common::*;
use fib::plan::{PlanCommand, RebasePlan};
use fib::rebase::{Action, Assembler, SourceRef};
use fib_amf::ScriptValue;
use std::io::Cursor;

fn plan_for(bytes: &[u8]) -> RebasePlan {
    let mut stream = Cursor::new(bytes);
    let tags = fib_flv::scan(&mut stream).unwrap();
    RebasePlan::from_scan("in.flv", "", true, &tags, &mut stream).unwrap()
}

#[test]
fn test_from_scan_entries() {
    let plan = plan_for(&sample_flv());
    assert_eq!(plan.tags.len(), 6);
    assert!(plan.source.skip_hash);

    let meta = &plan.tags[0];
    assert_eq!(meta.command, PlanCommand::Script);
    assert_eq!(meta.tag_type.as_deref(), Some("Script"));
    assert_eq!(meta.offset, Some(13));
    let body = meta.script.as_ref().unwrap();
    assert_eq!(body.name(), "onMetaData");
    assert_eq!(
        body.properties().get("width").and_then(ScriptValue::as_f64),
        Some(640.0)
    );

    let avc_header = &plan.tags[1];
    assert_eq!(avc_header.command, PlanCommand::Pick);
    assert_eq!(avc_header.index, 1);
    assert!(avc_header.keyframe && avc_header.header);
    assert_eq!(avc_header.size, Some(9));

    let last = &plan.tags[5];
    assert_eq!(last.timestamp, 40.0);
    assert!(!last.keyframe && !last.header);
    assert!(last.script.is_none());
}

#[test]
fn test_unedited_plan_rebuilds_source() {
    let source = sample_flv();
    let commands = plan_for(&source).to_commands().unwrap();

    let output = Assembler::new(MemoryOpener::new(source.clone()))
        .assemble(&commands, Vec::new())
        .unwrap();
    assert_eq!(output, source);
}

#[test]
fn test_edited_plan() {
    let source = sample_flv();
    let mut plan = plan_for(&source);

    // drop the audio, push the last frame later, pull a frame from elsewhere
    plan.tags[2].command = PlanCommand::Drop;
    plan.tags[4].command = PlanCommand::Drop;
    plan.tags[5].timestamp = 1000.0;
    plan.tags.push(fib::plan::PlanTag {
        from: Some("b.flv".into()),
        ..fib::plan::PlanTag::new(PlanCommand::Pick, 0, 1040.0)
    });

    let commands = plan.to_commands().unwrap();
    assert_eq!(
        commands[6].action,
        Action::Pick {
            source: SourceRef::Container("b.flv".into()),
            index: 0
        }
    );

    let opener = MemoryOpener::new(source).with(SourceRef::Container("b.flv".into()), other_flv());
    let output = Assembler::new(opener)
        .assemble(&commands, Vec::new())
        .unwrap();

    let tags = scan_bytes(&output);
    let timestamps: Vec<_> = tags.iter().map(|t| t.timestamp).collect();
    assert_eq!(timestamps, vec![0, 0, 0, 1000, 1040]);

    let body = fib_amf::ScriptTagBody::decode(&body_of(&output, &tags[0])).unwrap();
    assert_eq!(
        body.properties().get("duration").and_then(ScriptValue::as_f64),
        Some(1040.0 / 1000.0 + 1.0)
    );
}

#[test]
fn test_plan_json_round_trip() {
    let plan = plan_for(&sample_flv());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.json");

    plan.save(&path).unwrap();
    let loaded = RebasePlan::load(&path).unwrap();
    assert_eq!(loaded, plan);
    assert_eq!(loaded.to_commands().unwrap(), plan.to_commands().unwrap());
}

#[test]
fn test_undecodable_script_kept_as_pick() {
    let source = FlvBuilder::new()
        .tag(SCRIPT, 0, &[2, 0, 1, b'x', 4])
        .tag(VIDEO, 0, &[0x17, 1, 0])
        .build();
    let plan = plan_for(&source);
    assert_eq!(plan.tags[0].command, PlanCommand::Pick);
    assert!(plan.tags[0].script.is_none());

    let output = Assembler::new(MemoryOpener::new(source.clone()))
        .assemble(&plan.to_commands().unwrap(), Vec::new())
        .unwrap();
    assert_eq!(output, source);
}

#[test]
fn test_negative_timestamps_rebuild_unchanged() {
    let source = FlvBuilder::new()
        .script(&meta_body(Some(1.0)), 0)
        .tag(VIDEO, 0, &[0x17, 1, 0, 0, 0, 0x65])
        .tag(AUDIO, -33, &[0xaf, 1, 0x21])
        .tag(VIDEO, -1, &[0x27, 1, 0, 0, 0, 0x41])
        .build();
    let plan = plan_for(&source);
    let timestamps: Vec<_> = plan.tags.iter().map(|t| t.timestamp).collect();
    assert_eq!(timestamps, vec![0.0, 0.0, -33.0, -1.0]);

    let commands = plan.to_commands().unwrap();
    let output = Assembler::new(MemoryOpener::new(source.clone()))
        .assemble(&commands, Vec::new())
        .unwrap();
    assert_eq!(output, source);
}

#[test]
fn test_deepest_metadata_survives_plan_file() {
    let mut deep = ScriptValue::Null;
    for _ in 1..fib_amf::codec::MAX_DEPTH {
        deep = ScriptValue::StrictArray(vec![deep]);
    }
    let mut body = meta_body(Some(1.0));
    body.properties_mut().insert("nested", deep);
    let source = FlvBuilder::new()
        .script(&body, 0)
        .tag(VIDEO, 0, &[0x17, 1, 0, 0, 0, 0x65])
        .build();

    let plan = plan_for(&source);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("plan.json");
    plan.save(&path).unwrap();
    let loaded = RebasePlan::load(&path).unwrap();
    assert_eq!(loaded, plan);

    let output = Assembler::new(MemoryOpener::new(source.clone()))
        .assemble(&loaded.to_commands().unwrap(), Vec::new())
        .unwrap();
    assert_eq!(output, source);
}

//! Scout - 依赖感知的研究 Agent
//!
//! 入口：初始化日志、按配置组装 Agent，回答一个问题并打印答案。
//! 问题取自命令行参数；未给出时从 stdin 读取一行。

use std::io::BufRead;

use anyhow::Context;
use scout::{agent::create_agent, observability};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let question = read_question().context("Failed to read question")?;
    if question.is_empty() {
        anyhow::bail!("usage: scout \"<question>\" (or pipe one line on stdin)");
    }

    let agent = create_agent(None).await.context("Failed to create agent")?;
    let answer = agent
        .ask(&question)
        .await
        .context("Research run failed")?;

    println!("{}", answer);
    Ok(())
}

fn read_question() -> std::io::Result<String> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        return Ok(args.join(" ").trim().to_string());
    }
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

//! 默认知识库：Acme Robotics 的十条事实

pub const ACME_DOCUMENTS: [&str; 10] = [
    "Acme Robotics was founded in 2019 by CEO Dana Holt, formerly a principal engineer at Boston Dynamics.",
    "The company's flagship product is the AX-7, a warehouse navigation robot that uses lidar and a proprietary pathfinding algorithm called GridMind.",
    "GridMind was developed by Dr. Yusuf Okafor, Acme's Head of AI, who joined from CMU's robotics lab in 2021.",
    "Acme closed a $42M Series B in March 2024 led by Horizon Ventures. The round included participation from Ford's strategic investment arm.",
    "The AX-7 is deployed in 14 fulfillment centers across the Midwest, including three operated by a logistics firm called GreatLakes Distribution.",
    "Acme's main competitor is Fulcrum Robotics, which makes the R-Series robots and has 3x the revenue but older sensor tech.",
    "Dana Holt's long-term vision is to expand into hospital logistics by 2027, targeting medication delivery and sterile supply chain.",
    "Acme employs 87 people as of Q1 2025. Engineering is 60% of headcount. The office is in Ann Arbor, Michigan.",
    "The AX-7 has a list price of $85,000 per unit. GreatLakes Distribution operates 23 units and is Acme's largest single customer.",
    "Acme is in early talks with a European distributor, Munich-based RoboLogistik GmbH, to expand into the EU market in 2026.",
];
